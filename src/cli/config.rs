//! Agora configuration file handling
//!
//! Provides default configuration generation and loading for the agora CLI.
//! Configuration files are TOML format, stored under the user config
//! directory (`~/.config/agora/config.toml` on Linux).
//!
//! ## Client vs Chain Configuration
//!
//! This file contains CLIENT configuration only - the JSON-RPC endpoint,
//! deployed contract addresses, local key material, and logging.
//!
//! Governance parameters (voting window, NFT price, membership rules) live
//! in the deployed contracts and are controlled by the DAO itself. They
//! cannot be configured here.

use agora::eth::GOERLI_CHAIN_ID;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Agora CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgoraConfig {
    /// Ethereum network settings
    pub network: NetworkConfig,

    /// Deployed contract addresses
    pub contracts: ContractsConfig,

    /// Wallet key material
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ethereum network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint of an Ethereum node
    pub rpc_url: String,

    /// Chain id the endpoint must report. Connection is refused if the
    /// node reports anything else.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

/// Deployed contract addresses, hex encoded (0x-prefixed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// DAO contract (proposals, voting, treasury)
    pub dao: String,

    /// Membership NFT contract (gates proposal creation and voting)
    pub membership_token: String,
}

/// Wallet key material configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WalletConfig {
    /// Path to a file holding a hex-encoded private key.
    /// Leave unset to be prompted when a command needs to sign.
    pub key_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    /// `RUST_LOG` overrides this when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_chain_id() -> u64 {
    GOERLI_CHAIN_ID
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ContractsConfig {
    /// Parse the configured DAO address
    pub fn dao_address(&self) -> Result<Address, Box<dyn std::error::Error>> {
        parse_address(&self.dao, "contracts.dao")
    }

    /// Parse the configured membership token address
    pub fn token_address(&self) -> Result<Address, Box<dyn std::error::Error>> {
        parse_address(&self.membership_token, "contracts.membership_token")
    }
}

fn parse_address(raw: &str, field: &str) -> Result<Address, Box<dyn std::error::Error>> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| format!("Invalid address in {}: '{}' ({})", field, raw, e).into())
}

impl AgoraConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: AgoraConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        r#"# Agora CLI Configuration (Client Settings)
#
# This file contains CLIENT configuration only - the endpoint, contract
# addresses, and key material this machine uses to talk to the DAO.
#
# GOVERNANCE PARAMETERS (voting window, NFT price, membership rules) are
# enforced by the deployed contracts and controlled by the DAO. They cannot
# be changed from this file.

[network]
# JSON-RPC endpoint of a Goerli node (Infura, Alchemy, or your own)
rpc_url = "https://goerli.infura.io/v3/YOUR-PROJECT-ID"

# Chain id the endpoint must report. Goerli is 5.
# Connection is refused if the node reports anything else.
chain_id = 5

[contracts]
# Deployed DAO contract address
dao = "0x0000000000000000000000000000000000000000"

# Deployed membership NFT contract address
membership_token = "0x0000000000000000000000000000000000000000"

[wallet]
# Path to a file holding a hex-encoded private key (keep it mode 0600).
# Signing commands fall back to AGORA_PRIVATE_KEY, then to an interactive
# prompt, when this is unset.
# key_file = "/home/you/.config/agora/wallet.key"

[logging]
# Log level: trace, debug, info, warn, error
# RUST_LOG overrides this when set.
level = "info"
"#
        .to_string()
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml();

        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default config file path
///
/// Resolves to the platform config directory:
/// - Linux: ~/.config/agora/config.toml
/// - macOS: ~/Library/Application Support/agora/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agora")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_config() -> AgoraConfig {
        toml::from_str(
            r#"
[network]
rpc_url = "http://localhost:8545"
chain_id = 5

[contracts]
dao = "0x0000000000000000000000000000000000000da0"
membership_token = "0x000000000000000000000000000000000000cafe"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = sample_config();
        config.save(&config_path).unwrap();

        let loaded = AgoraConfig::load(&config_path).unwrap();
        assert_eq!(loaded.network.rpc_url, "http://localhost:8545");
        assert_eq!(loaded.network.chain_id, 5);
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        AgoraConfig::create_default(&config_path).unwrap();

        assert!(config_path.exists());

        // Verify it can be loaded and carries the Goerli chain id
        let config = AgoraConfig::load(&config_path).unwrap();
        assert_eq!(config.network.chain_id, GOERLI_CHAIN_ID);
        assert!(config.wallet.key_file.is_none());
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        // Write minimal config (only required fields)
        let minimal_config = r#"
[network]
rpc_url = "http://localhost:8545"

[contracts]
dao = "0x0000000000000000000000000000000000000da0"
membership_token = "0x000000000000000000000000000000000000cafe"
"#;
        fs::write(&config_path, minimal_config).unwrap();

        let config = AgoraConfig::load(&config_path).unwrap();

        // Verify defaults are applied
        assert_eq!(config.network.chain_id, GOERLI_CHAIN_ID);
        assert_eq!(config.logging.level, "info");
        assert!(config.wallet.key_file.is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = AgoraConfig::load(Path::new("/nonexistent/config.toml"));

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file"));
    }

    #[test]
    fn test_contract_addresses_parse() {
        let config = sample_config();

        let dao = config.contracts.dao_address().unwrap();
        assert_eq!(dao, Address::from_low_u64_be(0xDA0));

        let token = config.contracts.token_address().unwrap();
        assert_eq!(token, Address::from_low_u64_be(0xCAFE));
    }

    #[test]
    fn test_invalid_address_names_field() {
        let mut config = sample_config();
        config.contracts.dao = "not-an-address".to_string();

        let err = config.contracts.dao_address().unwrap_err();
        assert!(err.to_string().contains("contracts.dao"));
        assert!(err.to_string().contains("not-an-address"));
    }

    #[test]
    fn test_generate_default_toml() {
        let toml = AgoraConfig::generate_default_toml();

        assert!(toml.contains("chain_id = 5"));
        assert!(toml.contains("[contracts]"));
        assert!(toml.contains("membership_token"));
        // Governance parameters must not be configurable from this file
        assert!(!toml.contains("nft_price"));
        assert!(!toml.contains("voting_window"));
        assert!(toml.contains("GOVERNANCE PARAMETERS"));

        // The template itself must round-trip through the parser
        let parsed: AgoraConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.network.chain_id, GOERLI_CHAIN_ID);
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("agora/config.toml"));
    }
}
