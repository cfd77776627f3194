//! ClusterLens: a CLI frontend for a remote customer-analysis backend
//!
//! This library uploads customer CSV files to a clustering backend, normalizes
//! the JSON responses into ordered tables, and renders heatmaps and continent
//! pie charts from them.

pub mod cli;
pub mod client;
pub mod continent;
pub mod data;
pub mod error;
pub mod normalize;
pub mod viz;

// Re-export public items for easier access
pub use cli::{Args, Command};
pub use client::BackendClient;
pub use continent::{aggregate_local, flatten_backend, summarize, Continent};
pub use data::{load_customer_table, CustomerRecord, CustomerTable};
pub use error::LensError;
pub use normalize::{normalize, HeatmapTable};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
