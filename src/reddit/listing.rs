//! Subreddit listing fetcher.
//!
//! One authenticated GET per call against `{api_base}/r/{subreddit}/{sort}`,
//! paginated with the feed's `after` cursor. The fetcher flattens every
//! child's preview source variants into [`Candidate`]s without filtering;
//! acceptance decisions belong to the caller.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use crate::reddit::oauth::OAuthToken;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("listing request returned HTTP {status}, full body response: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse listing response: {source} (body excerpt: {excerpt})")]
    Parse {
        source: serde_json::Error,
        excerpt: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// One image variant discovered in a listing page, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Stable listing-item identifier, e.g. `t3_abc123`.
    pub uid: String,
    pub title: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl Candidate {
    /// Infer the image extension by substring match on the URL.
    pub fn file_extension(&self) -> Option<&'static str> {
        if self.url.contains(".jpg") {
            Some(".jpg")
        } else if self.url.contains(".png") {
            Some(".png")
        } else {
            None
        }
    }

    /// Derived on-disk filename, `uid + extension`. `None` when the URL has
    /// no recognizable image extension.
    pub fn file_name(&self) -> Option<String> {
        self.file_extension().map(|ext| format!("{}{}", self.uid, ext))
    }
}

/// The flattened result of one listing fetch. `after` is the uid of the last
/// child in the page — the cursor for the next fetch — and is `None` only
/// when the page had no children at all (end of listing).
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub candidates: Vec<Candidate>,
    pub after: Option<String>,
}

// Wire shapes for the nested listing response.

#[derive(Debug, Deserialize)]
struct ListingResponse {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: ListingChildData,
}

#[derive(Debug, Deserialize)]
struct ListingChildData {
    #[serde(default)]
    title: String,
    name: String,
    #[serde(default)]
    preview: Preview,
}

#[derive(Debug, Default, Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<PreviewImage>,
}

#[derive(Debug, Deserialize)]
struct PreviewImage {
    source: SourceImage,
}

#[derive(Debug, Deserialize)]
struct SourceImage {
    url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Fetch one listing page.
///
/// `cursor` is the uid of the last child seen on the previous page; `None`
/// starts from the top of the feed.
pub async fn fetch_page(
    client: &Client,
    config: &Config,
    cursor: Option<&str>,
    token: &OAuthToken,
) -> Result<ListingPage, FetchError> {
    let url = format!(
        "{}/r/{}/{}",
        config.reddit_api_endpoint, config.subreddit, config.subreddit_search_type
    );

    let mut request = client
        .get(&url)
        .query(&[("limit", config.query_batch_size.to_string())])
        .header(reqwest::header::USER_AGENT, config.user_agent())
        .header(
            reqwest::header::CONTENT_TYPE,
            &config.reddit_content_type_header,
        )
        .header(reqwest::header::AUTHORIZATION, token.authorization());
    if let Some(after) = cursor {
        request = request.query(&[("after", after)]);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: ListingResponse = serde_json::from_str(&body).map_err(|source| {
        let excerpt: String = body.chars().take(512).collect();
        FetchError::Parse { source, excerpt }
    })?;

    Ok(flatten(parsed))
}

fn flatten(response: ListingResponse) -> ListingPage {
    let after = response
        .data
        .children
        .last()
        .map(|child| child.data.name.clone());

    let mut candidates = Vec::new();
    for child in response.data.children {
        for image in child.data.preview.images {
            candidates.push(Candidate {
                uid: child.data.name.clone(),
                title: child.data.title.clone(),
                url: image.source.url,
                width: image.source.width,
                height: image.source.height,
            });
        }
    }

    tracing::debug!(
        candidates = candidates.len(),
        after = after.as_deref().unwrap_or("<none>"),
        "Flattened listing page"
    );
    ListingPage { candidates, after }
}
