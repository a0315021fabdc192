use std::path::PathBuf;

use agora::proposals::Vote;

use super::context::{connect_facade, init_logging, load_config};
use super::wallet;

/// Vote on an active proposal
///
/// One vote per proposal per wallet; its weight is the number of
/// membership NFTs the wallet holds. The contract rejects votes after
/// the deadline and repeat votes.
pub async fn execute(
    proposal_id: u64,
    choice: Vote,
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

    println!("📤 Voting {} on proposal {}...", choice, proposal_id);

    let outcome = facade.vote(proposal_id, choice).await?;
    println!("✅ Vote recorded (tx {:#x})", outcome.tx_hash);

    if let Some(p) = facade.proposal(proposal_id) {
        println!();
        println!(
            "   Proposal {} now stands at {} YAY / {} NAY",
            p.id, p.yay_votes, p.nay_votes
        );
    }

    facade.disconnect();
    Ok(())
}
