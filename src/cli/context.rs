//! Shared command setup: config resolution, logging, facade construction.

use std::path::PathBuf;

use agora::eth::RpcProvider;
use agora::governance::GovernanceFacade;
use ethers::signers::LocalWallet;
use tracing_subscriber::EnvFilter;

use super::config::{default_config_path, AgoraConfig};

/// Resolve the config path from the `--config` flag, falling back to the
/// platform default.
pub fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(default_config_path)
}

/// Load the config a command will run against.
///
/// A missing file is an error that points at `agora init` rather than a
/// bare ENOENT.
pub fn load_config(flag: Option<PathBuf>) -> Result<AgoraConfig, Box<dyn std::error::Error>> {
    let path = resolve_config_path(flag);

    if !path.exists() {
        return Err(format!(
            "No config file found at '{}'. Run `agora init` to create one.",
            path.display()
        )
        .into());
    }

    AgoraConfig::load(&path)
}

/// Initialize logging to stderr. `RUST_LOG` wins over the config level.
/// Stdout stays clean for command output and `--json`.
pub fn init_logging(config: &AgoraConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build a governance facade from the config and connect it.
///
/// Fails fast on a bad address, an unreachable endpoint, or a chain id
/// mismatch, before any command-specific work happens.
pub async fn connect_facade(
    config: &AgoraConfig,
    wallet: Option<LocalWallet>,
) -> Result<GovernanceFacade<RpcProvider>, Box<dyn std::error::Error>> {
    let dao = config.contracts.dao_address()?;
    let token = config.contracts.token_address()?;

    let provider = RpcProvider::new(&config.network.rpc_url, config.network.chain_id, wallet)?;
    let mut facade = GovernanceFacade::new(provider, config.network.chain_id, dao, token);
    facade.connect().await?;

    Ok(facade)
}
