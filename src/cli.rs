//! Command-line interface definitions and argument parsing

use clap::{Parser, Subcommand};

/// Customer clustering frontend: uploads customer CSVs to the analysis
/// backend and renders heatmaps, continent breakdowns, and lead reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the analysis backend
    #[arg(
        long,
        env = "CLUSTERLENS_BASE_URL",
        default_value = "http://127.0.0.1:5000"
    )]
    pub base_url: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a customer CSV for clustering and render the segment heatmap
    Cluster {
        /// Path to the input CSV file
        #[arg(short, long, default_value = "data.csv")]
        input: String,

        /// Output path for the heatmap PNG
        #[arg(short, long, default_value = "cluster_heatmap.png")]
        output: String,
    },

    /// Continent-level customer and revenue breakdown
    Continents {
        /// Path to the input CSV file
        #[arg(short, long, default_value = "data.csv")]
        input: String,

        /// Aggregate locally instead of calling the backend
        #[arg(long)]
        local: bool,

        /// Output path for the customer pie chart PNG
        #[arg(short, long, default_value = "continents.png")]
        output: String,
    },

    /// Look up potential customers for the given product ids
    Leads {
        /// Product ids to query
        #[arg(required = true)]
        products: Vec<String>,

        /// Optional CSV path for the contact export
        #[arg(long)]
        export: Option<String>,
    },
}
