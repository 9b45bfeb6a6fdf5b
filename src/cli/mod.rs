//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Output format for commands that print results.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
}

/// Storefront search - hybrid product search over a local catalog
#[derive(Parser, Debug)]
#[command(name = "sfs", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.storefront-search/data/catalog.db)
    #[arg(long, global = true, env = "SFS_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the catalog database
    Init {
        /// Replace an existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Search the catalog (semantic with QUERY, browse without)
    Search(SearchArgs),

    /// Catalog management
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Embedding provider configuration
    Embeddings {
        #[command(subcommand)]
        command: EmbeddingsCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Free-text query; omit to browse
    pub query: Option<String>,

    /// Category id
    #[arg(long)]
    pub category: Option<String>,

    /// Subcategory id
    #[arg(long)]
    pub subcategory: Option<String>,

    /// Minimum price (inclusive)
    #[arg(long)]
    pub min_price: Option<f64>,

    /// Maximum price (inclusive)
    #[arg(long)]
    pub max_price: Option<f64>,

    /// Minimum rating, 0-5
    #[arg(long)]
    pub rating: Option<f64>,

    /// Sort as field.direction (createdAt, title, price, rating, stock, similarity)
    #[arg(long)]
    pub sort: Option<String>,

    /// Page number, starting at 1
    #[arg(long, default_value = "1")]
    pub page: u32,
}

// ============================================================================
// Catalog Commands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum CatalogCommands {
    /// Import products from a JSONL file
    Import {
        /// JSONL file, one product per line
        file: PathBuf,
    },

    /// Compute embeddings for products that lack a current one
    Embed {
        /// Maximum products to process
        #[arg(short, long)]
        limit: Option<usize>,

        /// Recompute every embedding; without --limit this may switch to a
        /// model of another dimension
        #[arg(long)]
        force: bool,
    },

    /// Show catalog counts
    Stats,
}

// ============================================================================
// Embeddings Commands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum EmbeddingsCommands {
    /// Show embeddings status and configuration
    Status,

    /// Configure embedding provider
    Configure {
        /// Provider (ollama, huggingface)
        #[arg(short, long)]
        provider: Option<String>,

        /// Enable embeddings
        #[arg(long)]
        enable: bool,

        /// Disable embeddings
        #[arg(long)]
        disable: bool,

        /// Model to use (provider-specific)
        #[arg(short, long)]
        model: Option<String>,

        /// API endpoint (for custom servers)
        #[arg(long)]
        endpoint: Option<String>,

        /// API token (for HuggingFace)
        #[arg(long)]
        token: Option<String>,

        /// Remove all embedding settings
        #[arg(long, conflicts_with_all = ["provider", "enable", "disable", "model", "endpoint", "token"])]
        reset: bool,
    },

    /// Test embedding provider connectivity
    Test {
        /// Text to embed
        #[arg(default_value = "red running shoes")]
        text: String,
    },
}
