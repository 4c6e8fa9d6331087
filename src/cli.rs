use clap::Parser;

use crate::types::{LogLevel, SortOrder};

#[derive(Parser, Debug)]
#[command(
    name = "earthpullr-rs",
    about = "Download wallpaper-ready images from a subreddit"
)]
pub struct Cli {
    /// Directory to save images into (remembered across runs)
    #[arg(short = 'd', long)]
    pub directory: Option<String>,

    /// Number of images to retrieve
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,

    /// Minimum image width in pixels
    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    /// Minimum image height in pixels
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    /// Subreddit to pull from
    #[arg(short = 's', long)]
    pub subreddit: Option<String>,

    /// Listing sort order
    #[arg(long, value_enum)]
    pub sort: Option<SortOrder>,

    /// Listing items requested per page (max 100)
    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Overall time limit for the retrieval, in seconds
    #[arg(long)]
    pub max_time: Option<u64>,

    /// Path to a JSON config file overriding the built-in defaults
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    /// Reddit application client id.
    /// WARNING: passing via --client-id is visible in process listings.
    /// Prefer the REDDIT_CLIENT_ID environment variable instead.
    #[arg(long, env = "REDDIT_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}
