use std::path::PathBuf;

use ethers::types::U256;

use super::context::{connect_facade, init_logging, load_config};
use super::wallet;

/// Create a proposal to purchase an NFT with treasury funds
///
/// Requires a signing key and at least one membership NFT. The proposal
/// enters its voting window as soon as the transaction confirms.
pub async fn execute(
    token_id: u64,
    config: Option<PathBuf>,
    key_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    init_logging(&config);

    let key = wallet::load_wallet(wallet::determine_key_source(
        key_file,
        config.wallet.key_file.clone(),
    ))?;
    let mut facade = connect_facade(&config, Some(key)).await?;

    println!("📤 Proposing purchase of NFT token {}...", token_id);

    let outcome = facade.create_proposal(U256::from(token_id)).await?;
    println!("✅ Proposal created (tx {:#x})", outcome.tx_hash);

    // The follow-up refresh already pulled the new count
    let state = facade.state();
    if state.proposal_count > 0 {
        let id = state.proposal_count - 1;
        println!();
        println!("   Proposal id: {}", id);
        if let Some(p) = facade.proposal(id) {
            println!(
                "   Voting closes {}",
                super::render::format_timestamp(p.deadline)
            );
        }
        println!("   Members vote with: agora vote {} yay|nay", id);
    }

    facade.disconnect();
    Ok(())
}
