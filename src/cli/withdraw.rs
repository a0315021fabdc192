use std::io::{self, Write};
use std::path::PathBuf;

use super::context::{connect_facade, init_logging, load_config};
use super::render::format_eth;
use super::wallet;

/// Withdraw the DAO treasury to the owner wallet
///
/// Owner only; the contract enforces this and rejects an empty treasury.
/// Prompts for confirmation unless `--yes` is given.
pub async fn execute(
    yes: bool,
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

    let state = facade.state();
    println!("💰 DAO treasury: {} ETH", format_eth(state.treasury_balance));

    if !yes {
        print!("Withdraw the full treasury to the owner wallet? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !parse_confirmation(&input) {
            println!("Aborted.");
            facade.disconnect();
            return Ok(());
        }
    }

    let outcome = facade.withdraw().await?;
    println!("✅ Treasury withdrawn (tx {:#x})", outcome.tx_hash);

    let state = facade.state();
    println!("   Treasury now holds {} ETH", format_eth(state.treasury_balance));

    facade.disconnect();
    Ok(())
}

/// Parse user confirmation input. Pure logic portion so it can be unit
/// tested without stdin.
fn parse_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
