use std::path::PathBuf;

use super::config::AgoraConfig;
use super::context::resolve_config_path;

/// Generate a default configuration file
///
/// Writes a commented TOML template the operator fills in with their
/// JSON-RPC endpoint and the deployed contract addresses. Refuses to
/// overwrite an existing file unless `--force` is given.
pub fn execute(config: Option<PathBuf>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config);

    if config_path.exists() && !force {
        return Err(format!(
            "Config file already exists at '{}'. Use --force to overwrite.",
            config_path.display()
        )
        .into());
    }

    AgoraConfig::create_default(&config_path)?;

    println!("📝 Created default configuration: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set rpc_url to a Goerli JSON-RPC endpoint");
    println!("  2. Set the deployed DAO and membership token addresses");
    println!("  3. Optionally point wallet.key_file at a private key file");
    println!();
    println!("Then check your setup with: agora status");

    Ok(())
}
