//! Background retrieval orchestrator.
//!
//! Drives the fetch → filter → download cycle: one OAuth token up front, then
//! listing pages walked by cursor until the requested number of images has
//! been saved. The cursor advances to the last child of every page before
//! filtering, so a page that yields nothing acceptable still moves the walk
//! forward. Downloads run strictly one at a time and any failure ends the
//! run; the ledger is flushed after every completed batch so earlier batches
//! survive a late failure.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use reqwest::Client;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigError};
use crate::download::{self, DownloadError};
use crate::filter::{self, FilterCriteria};
use crate::ledger::{Ledger, LedgerError};
use crate::reddit::listing::{self, FetchError};
use crate::reddit::oauth::{self, AuthError};

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to retrieve oauth token: {0}")]
    Auth(#[from] AuthError),

    #[error("failed to get listings for subreddit: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to retrieve image batch: {0}")]
    Download(#[from] DownloadError),

    #[error("failed to persist ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("retrieval exceeded the {limit_secs}s time limit after saving {saved} of {requested} images")]
    DeadlineExceeded {
        limit_secs: u64,
        saved: u32,
        requested: u32,
    },

    #[error("subreddit listing exhausted after saving {saved} of {requested} images")]
    ListingExhausted { saved: u32, requested: u32 },

    #[error("retrieval cancelled after saving {saved} images")]
    Cancelled { saved: u32 },
}

/// One retrieval request, immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct BackgroundsRequest {
    pub width: u32,
    pub height: u32,
    pub count: u32,
    /// Must exist before the run starts; the caller checks this.
    pub download_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalSummary {
    pub saved: u32,
}

/// Receives one notification per saved image. Implemented by the progress bar
/// in the binary; anything user-facing stays behind this seam.
pub trait ProgressObserver: Send + Sync {
    fn image_saved(&self, filename: &str, saved: u32, requested: u32);
}

/// Observer that discards every notification.
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn image_saved(&self, _filename: &str, _saved: u32, _requested: u32) {}
}

pub struct BackgroundRetriever {
    client: Client,
    config: Config,
}

impl BackgroundRetriever {
    /// Validate the configuration and build the HTTP client shared by every
    /// request in a run (token exchange, listing fetches, image downloads).
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Run one retrieval to completion.
    ///
    /// Returns the saved count on success. Every failure is terminal: there
    /// is no retry and no partial-batch recovery, though images downloaded in
    /// completed batches remain on disk and in the flushed ledger.
    pub async fn run(
        &self,
        request: &BackgroundsRequest,
        shutdown: CancellationToken,
        progress: &dyn ProgressObserver,
    ) -> Result<RetrievalSummary, RetrieveError> {
        filter::validate_resolution(request.width, request.height, self.config.max_resolution)?;

        tracing::info!(
            "Received a request to retrieve {} backgrounds with a minimum resolution of {}x{} to directory {}",
            request.count,
            request.width,
            request.height,
            request.download_path.display(),
        );

        let started = Instant::now();
        let deadline = Duration::from_secs(self.config.max_aggregated_query_time_secs);

        let token = oauth::request_token(&self.client, &self.config).await?;

        let ledger_path = request
            .download_path
            .join(&self.config.existing_images_filename);
        let mut ledger = Ledger::load(&ledger_path);

        let criteria = FilterCriteria {
            target_width: request.width,
            target_height: request.height,
            aspect_tolerance: self.config.aspect_tolerance,
        };

        let mut saved: u32 = 0;
        let mut cursor: Option<String> = None;

        while saved < request.count {
            if shutdown.is_cancelled() {
                tracing::info!("Shutdown requested, stopping retrieval");
                return Err(RetrieveError::Cancelled { saved });
            }
            if started.elapsed() > deadline {
                return Err(RetrieveError::DeadlineExceeded {
                    limit_secs: self.config.max_aggregated_query_time_secs,
                    saved,
                    requested: request.count,
                });
            }

            let page =
                listing::fetch_page(&self.client, &self.config, cursor.as_deref(), &token).await?;

            // No children at all means the feed has run out; there is no
            // explicit has-more signal to consult.
            let Some(last_seen) = page.after else {
                return Err(RetrieveError::ListingExhausted {
                    saved,
                    requested: request.count,
                });
            };
            // Advance before filtering so a fully-rejected page still makes
            // forward progress.
            cursor = Some(last_seen);

            let remaining = (request.count - saved) as usize;
            let accepted: Vec<_> = page
                .candidates
                .iter()
                .filter(|c| criteria.accepts(c, &ledger))
                .take(remaining)
                .collect();

            if accepted.is_empty() {
                tracing::debug!(
                    cursor = cursor.as_deref().unwrap_or_default(),
                    "No acceptable candidates in page, fetching next",
                );
                continue;
            }

            for candidate in accepted {
                let filename =
                    download::save_image(&self.client, candidate, &request.download_path).await?;
                ledger.record(filename.clone());
                saved += 1;
                progress.image_saved(&filename, saved, request.count);
            }

            // Persist after each completed batch so a failure later in the
            // run cannot forget what this batch downloaded.
            ledger.flush(&ledger_path)?;
        }

        tracing::info!(saved, "Retrieval complete");
        Ok(RetrievalSummary { saved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_resolution_fails_before_any_network_call() {
        // No mock server: a network attempt would error differently, so a
        // ConfigError here proves the precondition ran first.
        let mut config = Config::default();
        config.reddit_access_token_url = "http://127.0.0.1:1/token".to_string();
        config.reddit_api_endpoint = "http://127.0.0.1:1".to_string();
        let retriever = BackgroundRetriever::new(config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut request = BackgroundsRequest {
            width: 0,
            height: 1080,
            count: 1,
            download_path: dir.path().to_path_buf(),
        };
        let err = retriever
            .run(&request, CancellationToken::new(), &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrieveError::Config(ConfigError::InvalidResolution { width: 0, .. })
        ));

        request.width = 1920;
        request.height = 8000;
        let err = retriever
            .run(&request, CancellationToken::new(), &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrieveError::Config(ConfigError::InvalidResolution { height: 8000, .. })
        ));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_stops_before_downloads() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"access_token": "t", "token_type": "bearer"}),
            ))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.reddit_access_token_url = format!("{}/token", server.uri());
        config.reddit_api_endpoint = server.uri();
        let retriever = BackgroundRetriever::new(config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let request = BackgroundsRequest {
            width: 1920,
            height: 1080,
            count: 1,
            download_path: dir.path().to_path_buf(),
        };
        let token = CancellationToken::new();
        token.cancel();
        let err = retriever
            .run(&request, token, &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, RetrieveError::Cancelled { saved: 0 }));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.query_batch_size = 0;
        assert!(BackgroundRetriever::new(config).is_err());
    }
}
