use std::path::PathBuf;

use agora::proposals::Vote;

use super::context::{connect_facade, init_logging, load_config};
use super::render::format_eth;
use super::wallet;

/// Execute a proposal whose voting deadline has passed
///
/// If YAY won, the contract buys the proposed NFT with treasury funds.
/// Either way the proposal is marked executed and leaves the active set.
pub async fn execute(
    proposal_id: u64,
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

    println!("📤 Executing proposal {}...", proposal_id);

    let outcome = facade.execute(proposal_id).await?;
    println!("✅ Proposal {} executed (tx {:#x})", proposal_id, outcome.tx_hash);

    if let Some(p) = facade.proposal(proposal_id) {
        println!();
        match p.winning_side() {
            Vote::Yay => println!(
                "   YAY won {} to {} - the DAO purchased NFT token {}",
                p.yay_votes, p.nay_votes, p.nft_token_id
            ),
            Vote::Nay => println!(
                "   NAY won {} to {} - no purchase was made",
                p.nay_votes, p.yay_votes
            ),
        }
    }

    let state = facade.state();
    println!("   Treasury now holds {} ETH", format_eth(state.treasury_balance));

    facade.disconnect();
    Ok(())
}
