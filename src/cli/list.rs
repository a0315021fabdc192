use std::path::PathBuf;
use std::time::SystemTime;

use agora::proposals::{Proposal, ProposalStatus};

use super::context::{connect_facade, init_logging, load_config};
use super::render::{format_deadline, format_timestamp, unix_seconds};
use super::wallet;

/// List all proposals with vote counts and live status
///
/// Status is derived at print time from the executed flag and the
/// deadline, so the same chain data reads "active" before the deadline
/// and "expired (unexecuted)" after it.
pub async fn execute(
    config: Option<PathBuf>,
    key_file: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    init_logging(&config);

    let wallet = wallet::maybe_load_wallet(key_file, config.wallet.key_file.clone())?;
    let mut facade = connect_facade(&config, wallet).await?;

    facade.refresh_proposals().await?;
    let proposals = facade.proposals();
    let now = SystemTime::now();

    if json {
        let payload: Vec<_> = proposals.iter().map(|p| proposal_json(p, now)).collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        facade.disconnect();
        return Ok(());
    }

    if proposals.is_empty() {
        println!("No proposals yet.");
        println!("Members can create one with: agora propose <token-id>");
        facade.disconnect();
        return Ok(());
    }

    println!("🗳  Proposals ({})", proposals.len());
    println!();

    for p in &proposals {
        print_proposal(p, now);
        println!();
    }

    facade.disconnect();
    Ok(())
}

fn print_proposal(p: &Proposal, now: SystemTime) {
    println!("#{}  NFT token {}", p.id, p.nft_token_id);

    match p.status_at(now) {
        ProposalStatus::Active => {
            println!(
                "    active, voting closes {} ({})",
                format_deadline(p.deadline, now),
                format_timestamp(p.deadline)
            );
        }
        ProposalStatus::ExpiredUnexecuted => {
            println!(
                "    expired (unexecuted), deadline was {} - {} wins, awaiting execution",
                format_deadline(p.deadline, now),
                p.winning_side()
            );
        }
        ProposalStatus::Executed => {
            println!("    executed, {} won", p.winning_side());
        }
    }

    println!("    votes: {} YAY / {} NAY", p.yay_votes, p.nay_votes);
}

fn proposal_json(p: &Proposal, now: SystemTime) -> serde_json::Value {
    let status = p.status_at(now);
    let winning_side = match status {
        ProposalStatus::Active => None,
        _ => Some(p.winning_side().to_string()),
    };

    serde_json::json!({
        "id": p.id,
        "nft_token_id": p.nft_token_id.to_string(),
        "deadline": format_timestamp(p.deadline),
        "deadline_unix": unix_seconds(p.deadline),
        "yay_votes": p.yay_votes.to_string(),
        "nay_votes": p.nay_votes.to_string(),
        "executed": p.executed,
        "status": status.to_string(),
        "winning_side": winning_side,
    })
}
