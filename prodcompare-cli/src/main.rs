//! ProductCompare CLI: terminal front end for the comparison engine.
//!
//! Compares catalog products side by side, keeps a persisted comparison
//! selection, and exports the compared set as JSON or CSV.

mod commands;
mod render;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// ProductCompare: side-by-side product comparison
#[derive(Parser, Debug)]
#[command(name = "prodcompare", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Compare products side by side
    Compare {
        /// Catalog JSON file
        catalog: PathBuf,
        /// Product ids to compare (defaults to the saved selection)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Hide rows whose values are identical across products
        #[arg(long)]
        hide_identical: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Export the compared products to a file
    Export {
        /// Catalog JSON file
        catalog: PathBuf,
        /// Product ids to export (defaults to the saved selection)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Export format: json or csv
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Output directory (defaults to the workspace)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List catalog products matching a filter
    List {
        /// Catalog JSON file
        catalog: PathBuf,
        /// Text to search for in names and descriptions
        #[arg(long)]
        query: Option<String>,
        /// Exact category
        #[arg(long)]
        category: Option<String>,
        /// Exact brand
        #[arg(long)]
        brand: Option<String>,
        /// Minimum price
        #[arg(long)]
        min: Option<f64>,
        /// Maximum price
        #[arg(long)]
        max: Option<f64>,
    },
    /// Manage the saved comparison selection
    Select {
        #[command(subcommand)]
        action: SelectAction,
    },
    /// Manage favorite products
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
    /// Manage product comments
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },
    /// Sign in and out of the demo accounts
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Add a product to a catalog (admin only)
    AddProduct {
        /// Catalog JSON file, rewritten in place
        catalog: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        brand: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        price: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Specification as label=value (repeatable)
        #[arg(long = "spec")]
        specs: Vec<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum SelectAction {
    /// Add products to the selection
    Add {
        /// Product ids
        #[arg(required = true)]
        ids: Vec<String>,
        /// Catalog to check the ids against
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Remove a product from the selection
    Remove {
        /// Product id
        id: String,
    },
    /// Show the selection
    List,
    /// Empty the selection
    Clear,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum FavoriteAction {
    /// Toggle a product's favorite flag
    Toggle {
        /// Product id
        id: String,
    },
    /// Show favorite product ids
    List,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum CommentAction {
    /// Add a comment to a product
    Add {
        /// Product id
        product_id: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        text: String,
        /// Rating from 1 to 5
        #[arg(long, default_value = "5")]
        rating: u8,
    },
    /// Show comments for a product, newest first
    List {
        /// Product id
        product_id: String,
    },
    /// Delete a comment
    Delete {
        /// Comment id
        id: String,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum AuthAction {
    /// Sign in with an existing account
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        /// Account role
        #[arg(long, value_enum, default_value_t = RoleArg::Buyer)]
        role: RoleArg,
    },
    /// Change the signed-in user's profile
    Update {
        #[arg(long)]
        name: Option<String>,
        /// Avatar URL; an empty value removes it
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RoleArg {
    Buyer,
    Admin,
}

impl From<RoleArg> for prodcompare_core::Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Buyer => Self::Buyer,
            RoleArg::Admin => Self::Admin,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Write the default workspace configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show current configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "prodcompare", "prodcompare")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "prodcompare.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    // Config commands work on the files themselves.
    if let Commands::Config { action } = cli.command {
        return commands::handle_config(action, &workspace, cli.config.as_deref());
    }

    if !prodcompare_core::config::config_exists(Some(&workspace)) && cli.config.is_none() {
        tracing::debug!("no configuration file found, using defaults");
    }
    let config =
        prodcompare_core::load_config(Some(&workspace), cli.config.as_deref(), None)
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    commands::handle_command(cli.command, &workspace, &config)
}
