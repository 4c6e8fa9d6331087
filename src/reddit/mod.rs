//! Reddit API plumbing: application-only OAuth2 and the subreddit listing
//! endpoint. Both speak through a caller-supplied [`reqwest::Client`] so the
//! request timeout is configured in one place.

pub mod listing;
pub mod oauth;

pub use listing::{fetch_page, Candidate, FetchError, ListingPage};
pub use oauth::{request_token, AuthError, OAuthToken};
