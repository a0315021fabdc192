//! Wallet key loading for commands that sign transactions.
//!
//! Private keys are 32-byte secp256k1 scalars, hex encoded, with an
//! optional `0x` prefix. Key material never leaves this module as a plain
//! `String`; intermediate buffers are zeroized after the wallet is built.

use std::fs;
use std::path::{Path, PathBuf};

use ethers::signers::LocalWallet;
use zeroize::{Zeroize, Zeroizing};

/// Environment variable consulted for a private key
pub const KEY_ENV_VAR: &str = "AGORA_PRIVATE_KEY";

/// Sources for a signing key, checked in order
#[derive(Debug)]
pub enum KeySource {
    /// From --key-file or the config's wallet.key_file
    File(PathBuf),
    /// From AGORA_PRIVATE_KEY env var (fallback, warned as insecure)
    EnvVar,
    /// From stdin prompt (interactive, masked input)
    Prompt,
}

/// Determine the key source from CLI flag, environment, and config
///
/// Precedence:
/// 1. `--key-file` flag if provided
/// 2. `AGORA_PRIVATE_KEY` environment variable
/// 3. `wallet.key_file` from the config
/// 4. Interactive prompt (stdin)
pub fn determine_key_source(
    key_file_flag: Option<PathBuf>,
    config_key_file: Option<PathBuf>,
) -> KeySource {
    if let Some(path) = key_file_flag {
        KeySource::File(path)
    } else if std::env::var(KEY_ENV_VAR).is_ok() {
        KeySource::EnvVar
    } else if let Some(path) = config_key_file {
        KeySource::File(path)
    } else {
        KeySource::Prompt
    }
}

/// Load a wallet for a command that must sign transactions
pub fn load_wallet(source: KeySource) -> Result<LocalWallet, Box<dyn std::error::Error>> {
    match source {
        KeySource::File(path) => load_from_file(&path),
        KeySource::EnvVar => {
            eprintln!("⚠️  WARNING: Using {} env var is insecure", KEY_ENV_VAR);
            eprintln!("   Other processes can read your environment. Prefer a key file.");
            eprintln!();

            let raw = Zeroizing::new(
                std::env::var(KEY_ENV_VAR).map_err(|_| format!("{} env var not set", KEY_ENV_VAR))?,
            );
            parse_key(raw.trim())
        }
        KeySource::Prompt => {
            let raw = Zeroizing::new(
                rpassword::prompt_password("Enter wallet private key (hex): ")
                    .map_err(|e| format!("Failed to read key from stdin: {}", e))?,
            );

            if raw.trim().is_empty() {
                return Err("Private key cannot be empty".into());
            }

            parse_key(raw.trim())
        }
    }
}

/// Load a wallet only if key material is already on hand (flag, env, or
/// config), without ever prompting.
///
/// Read commands use this: the output can show membership and ownership
/// when a key is configured, but a bare `agora status` must not stop and
/// ask for one.
pub fn maybe_load_wallet(
    key_file_flag: Option<PathBuf>,
    config_key_file: Option<PathBuf>,
) -> Result<Option<LocalWallet>, Box<dyn std::error::Error>> {
    match determine_key_source(key_file_flag, config_key_file) {
        KeySource::Prompt => Ok(None),
        source => load_wallet(source).map(Some),
    }
}

fn load_from_file(path: &Path) -> Result<LocalWallet, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Key file not found: {}", path.display()).into());
    }

    let raw = Zeroizing::new(
        fs::read_to_string(path)
            .map_err(|e| format!("Failed to read key file '{}': {}", path.display(), e))?,
    );

    if raw.trim().is_empty() {
        return Err(format!("Key file is empty: {}", path.display()).into());
    }

    parse_key(raw.trim())
}

/// Parse a hex private key, zeroizing the decoded bytes afterwards
fn parse_key(raw: &str) -> Result<LocalWallet, Box<dyn std::error::Error>> {
    let hex_str = raw.strip_prefix("0x").unwrap_or(raw);

    let mut bytes = hex::decode(hex_str)
        .map_err(|e| format!("Private key is not valid hex: {}", e))?;

    if bytes.len() != 32 {
        bytes.zeroize();
        return Err(format!("Private key must be 32 bytes, got {}", bytes.len()).into());
    }

    let wallet = LocalWallet::from_bytes(&bytes).map_err(|e| format!("Invalid private key: {}", e));
    bytes.zeroize();

    Ok(wallet?)
}
