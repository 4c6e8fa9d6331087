use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use earthpullr_rs::cli::Cli;
use earthpullr_rs::retriever::{
    BackgroundRetriever, BackgroundsRequest, NoopProgress, ProgressObserver,
};
use earthpullr_rs::settings::{default_settings_path, UserSettings};
use earthpullr_rs::{shutdown, Config};

/// Expand ~ to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Progress bar wrapper used when stdout is a terminal.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(requested: u32) -> Self {
        let bar = ProgressBar::new(u64::from(requested));
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                .expect("static progress template is valid"),
        );
        Self { bar }
    }
}

impl ProgressObserver for BarProgress {
    fn image_saved(&self, filename: &str, _saved: u32, _requested: u32) {
        self.bar.inc(1);
        self.bar.set_message(filename.to_string());
    }
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(subreddit) = &cli.subreddit {
        config.subreddit = subreddit.clone();
    }
    if let Some(sort) = cli.sort {
        config.subreddit_search_type = sort.as_str().to_string();
    }
    if let Some(batch_size) = cli.batch_size {
        config.query_batch_size = batch_size;
    }
    if let Some(max_time) = cli.max_time {
        config.max_aggregated_query_time_secs = max_time;
    }
    if let Some(client_id) = &cli.client_id {
        config.reddit_app_client_id = client_id.clone();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let mut config = Config::load(cli.config.as_deref().map(std::path::Path::new))?;
    apply_cli_overrides(&mut config, &cli);

    let settings_path = default_settings_path();
    let mut settings = UserSettings::load(&settings_path);

    let download_path = cli
        .directory
        .as_deref()
        .map(expand_tilde)
        .or_else(|| settings.download_path.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("no download directory: pass --directory (it is remembered afterwards)")
        })?;
    if !download_path.is_dir() {
        anyhow::bail!("Download path '{}' does not exist", download_path.display());
    }

    let request = BackgroundsRequest {
        width: cli.width,
        height: cli.height,
        count: cli.count,
        download_path: download_path.clone(),
    };

    let retriever = BackgroundRetriever::new(config)?;
    let shutdown_token = shutdown::install_signal_handler();

    let progress: Box<dyn ProgressObserver> =
        if cli.no_progress_bar || !std::io::stdout().is_terminal() {
            Box::new(NoopProgress)
        } else {
            Box::new(BarProgress::new(cli.count))
        };

    let summary = retriever
        .run(&request, shutdown_token, progress.as_ref())
        .await?;

    tracing::info!(saved = summary.saved, "Saved {} image(s) to '{}'", summary.saved, download_path.display());

    settings.download_path = Some(download_path);
    if let Err(e) = settings.save(&settings_path) {
        tracing::warn!(path = %settings_path.display(), "Failed to save user settings: {e}");
    }

    Ok(())
}
