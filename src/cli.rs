use clap::{Args, Parser, Subcommand};
use flipper_scanner::scanner::SortKey;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "flipper")]
#[command(about = "Scan marketplace listings for resale profit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load the configured catalog sources and scan them
    Scan(ScanArgs),
    /// Query the search proxy and scan its results
    Search {
        /// Free-text search sent to the proxy
        query: String,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Manage the saved watchlist
    #[command(subcommand)]
    Watchlist(WatchlistCommand),
    /// Show or change stored preferences
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Bucket prefix, or "all"
    #[arg(long, default_value = "all")]
    pub category: String,

    /// Marketplaces to include
    #[arg(long, value_delimiter = ',', default_values_t = vec!["ebay".to_string(), "amazon".to_string()])]
    pub marketplace: Vec<String>,

    /// Case-insensitive substring filter on item names
    #[arg(long, default_value = "")]
    pub filter: String,

    /// field-direction, e.g. price-desc
    #[arg(long, default_value = "confidence-desc")]
    pub sort: SortKey,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Overrides the stored confidence limit
    #[arg(long)]
    pub confidence_limit: Option<f64>,

    /// Overrides the stored profit limit
    #[arg(long)]
    pub profit_limit: Option<f64>,

    /// Overrides the stored budget
    #[arg(long)]
    pub budget: Option<f64>,

    /// Display ids to save to the watchlist after the scan
    #[arg(long = "save", value_delimiter = ',')]
    pub save: Vec<String>,

    /// Display id to print a profit analysis for
    #[arg(long)]
    pub analyze: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum WatchlistCommand {
    /// Print saved entries
    List,
    /// Save a single item by hand
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value_t = 75.0)]
        confidence: f64,
        #[arg(long, default_value = "ebay")]
        marketplace: String,
    },
    /// Remove every entry
    Clear,
    /// Write the watchlist as JSON into a directory
    Export {
        /// Defaults to FLIPPER_EXPORT_DIR
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Merge a previously exported file
    Import {
        file: PathBuf,
        /// Halve imported prices, as older exports were read
        #[arg(long)]
        legacy_half_price: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        budget: Option<f64>,
        #[arg(long)]
        confidence_limit: Option<f64>,
        #[arg(long)]
        profit_limit: Option<f64>,
        #[arg(long)]
        thumbnails: Option<bool>,
    },
}
