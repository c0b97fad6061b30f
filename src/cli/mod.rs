//! Command-line interface.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::{DiscoverySource, HandleStatus};

#[derive(Parser)]
#[command(name = "shopcrawl")]
#[command(about = "Short-form video harvester with commerce product enrichment")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file or URL (overrides config and DATABASE_URL)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check for the verbose flag before clap runs, so logging can start first.
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database schema
    Init,

    /// Discover videos from hashtags and tracked handles
    Videos {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Enrich referenced products with catalog metadata
    Products {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Show collection counts
    Status,

    /// Manage tracked creator handles
    Handles {
        #[command(subcommand)]
        command: HandleCommands,
    },
}

#[derive(Subcommand)]
enum HandleCommands {
    /// Start tracking one or more handles
    Add {
        /// Usernames, with or without a leading @
        #[arg(required = true)]
        usernames: Vec<String>,
        /// How the handles were found
        #[arg(long, value_enum, default_value = "manual")]
        source: DiscoverySource,
    },

    /// List tracked handles, best shop ratio first
    List {
        /// Only show handles with this status
        #[arg(long, value_enum)]
        status: Option<HandleStatus>,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        database: cli.database,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => commands::init::cmd_init(&settings).await,
        Commands::Videos { once } => commands::cycles::cmd_videos(&settings, once).await,
        Commands::Products { once } => commands::cycles::cmd_products(&settings, once).await,
        Commands::Status => commands::status::cmd_status(&settings).await,
        Commands::Handles { command } => match command {
            HandleCommands::Add { usernames, source } => {
                commands::handles::cmd_handles_add(&settings, &usernames, source).await
            }
            HandleCommands::List { status } => {
                commands::handles::cmd_handles_list(&settings, status).await
            }
        },
    }
}
