use std::path::PathBuf;

use agora::proposals::Vote;
use clap::{Parser, Subcommand};

pub mod config;
pub mod context;
pub mod execute;
pub mod init;
pub mod list;
pub mod propose;
pub mod render;
pub mod status;
pub mod version;
pub mod vote;
pub mod wallet;
pub mod withdraw;

#[derive(Parser)]
#[command(name = "agora")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Membership-gated DAO governance from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a default configuration file
    Init {
        /// Where to write the config (default: ~/.config/agora/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show connection, membership, and treasury state
    Status {
        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a file holding the wallet private key
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Print machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List all proposals with vote counts and live status
    List {
        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a file holding the wallet private key
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Print machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Create a proposal to purchase an NFT with treasury funds
    Propose {
        /// Marketplace token id the DAO would purchase if the vote passes
        token_id: u64,

        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a file holding the wallet private key
        #[arg(long)]
        key_file: Option<PathBuf>,
    },

    /// Vote on an active proposal
    Vote {
        /// Proposal id to vote on
        proposal_id: u64,

        /// Side to vote for: yay or nay (case-insensitive)
        choice: Vote,

        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a file holding the wallet private key
        #[arg(long)]
        key_file: Option<PathBuf>,
    },

    /// Execute a proposal whose voting deadline has passed
    Execute {
        /// Proposal id to execute
        proposal_id: u64,

        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a file holding the wallet private key
        #[arg(long)]
        key_file: Option<PathBuf>,
    },

    /// Withdraw the DAO treasury to the owner wallet (owner only)
    Withdraw {
        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a file holding the wallet private key
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init { config, force } => init::execute(config, force),
        Commands::Status {
            config,
            key_file,
            json,
        } => status::execute(config, key_file, json).await,
        Commands::List {
            config,
            key_file,
            json,
        } => list::execute(config, key_file, json).await,
        Commands::Propose {
            token_id,
            config,
            key_file,
        } => propose::execute(token_id, config, key_file).await,
        Commands::Vote {
            proposal_id,
            choice,
            config,
            key_file,
        } => vote::execute(proposal_id, choice, config, key_file).await,
        Commands::Execute {
            proposal_id,
            config,
            key_file,
        } => execute::execute(proposal_id, config, key_file).await,
        Commands::Withdraw {
            config,
            key_file,
            yes,
        } => withdraw::execute(yes, config, key_file).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
