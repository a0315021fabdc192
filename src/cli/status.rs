use std::path::PathBuf;

use super::context::{connect_facade, init_logging, load_config};
use super::render::format_eth;
use super::wallet;

/// Show connection, membership, and treasury state
///
/// Connects a session (read-only when no key is on hand), loads the
/// governance overview, and prints it. `--json` emits a machine-readable
/// snapshot on stdout instead.
pub async fn execute(
    config: Option<PathBuf>,
    key_file: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    init_logging(&config);

    let wallet = wallet::maybe_load_wallet(key_file, config.wallet.key_file.clone())?;
    let mut facade = connect_facade(&config, wallet).await?;
    let state = facade.state();

    if json {
        let payload = serde_json::json!({
            "connection": state.connection.to_string(),
            "chain_id": config.network.chain_id,
            "dao": format!("{:#x}", facade.dao_address()),
            "membership_token": format!("{:#x}", facade.token_address()),
            "address": facade.identity().map(|a| format!("{:#x}", a)),
            "wallet_connected": state.wallet_connected,
            "is_owner": state.is_owner,
            "membership_nfts": state.member_token_balance.to_string(),
            "treasury_wei": state.treasury_balance.to_string(),
            "proposal_count": state.proposal_count,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        facade.disconnect();
        return Ok(());
    }

    println!("📊 Agora DAO Status");
    println!();
    println!("Network:");
    println!("  Endpoint:         {}", config.network.rpc_url);
    println!("  Chain id:         {}", config.network.chain_id);
    println!("  DAO:              {:#x}", facade.dao_address());
    println!("  Membership token: {:#x}", facade.token_address());
    println!();

    match facade.identity() {
        Some(address) => {
            println!("Wallet:");
            println!("  Address:          {:#x}", address);
            println!("  Membership NFTs:  {}", state.member_token_balance);
            if state.is_owner {
                println!("  Role:             DAO owner 👑");
            }
            if state.member_token_balance.is_zero() {
                println!();
                println!("⚠️  This wallet holds no membership NFTs.");
                println!("   Proposing and voting require at least one.");
            }
        }
        None => {
            println!("Wallet: none (read-only session)");
            println!("  Set wallet.key_file or pass --key-file to sign transactions.");
        }
    }

    println!();
    println!("Treasury:  {} ETH", format_eth(state.treasury_balance));
    println!("Proposals: {}", state.proposal_count);

    facade.disconnect();
    Ok(())
}
