use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(author, version, about = "Video ingestion, trimming, merging and share links")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a video file as a new asset
    Ingest {
        /// Video file to ingest
        #[arg(required = true)]
        file: PathBuf,

        /// Content type to declare for the upload
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Cut a sub-range out of an asset into a new asset
    Trim {
        /// Source asset ID
        asset_id: String,

        /// Start offset in seconds
        #[arg(long)]
        start: f64,

        /// End offset in seconds
        #[arg(long)]
        end: f64,
    },

    /// Concatenate two or more assets, in order, into a new asset
    Merge {
        /// Asset IDs in playback order
        #[arg(required = true, num_args = 2..)]
        asset_ids: Vec<String>,
    },

    /// List all assets, newest first
    Assets,

    /// Show a single asset
    Asset {
        /// Asset ID
        id: String,
    },

    /// Manage share links
    Share {
        #[command(subcommand)]
        command: ShareCommands,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ShareCommands {
    /// Issue a link to an asset
    Create {
        /// Asset ID
        asset_id: String,

        /// Hours until the link expires
        #[arg(long, default_value = "24", allow_hyphen_values = true)]
        ttl_hours: i64,
    },

    /// Resolve a live link to its asset
    Resolve {
        /// Share link ID
        id: String,
    },

    /// List live links
    List {
        /// Only links for this asset
        #[arg(long)]
        asset: Option<String>,
    },

    /// List live links expiring soon
    Expiring {
        /// Window size in hours
        #[arg(long, default_value = "24", allow_hyphen_values = true)]
        within_hours: i64,
    },

    /// Delete a link (succeeds if it is already gone)
    Delete {
        /// Share link ID
        id: String,
    },
}
