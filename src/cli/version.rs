use agora::eth::GOERLI_CHAIN_ID;

/// Display version information
pub fn execute() {
    println!("agora {}", env!("CARGO_PKG_VERSION"));
    println!("Membership-NFT gated DAO governance client");
    println!("Supported network: Goerli (chain id {GOERLI_CHAIN_ID})");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_execute() {
        // Must not panic; output goes straight to stdout
        execute();
    }
}
