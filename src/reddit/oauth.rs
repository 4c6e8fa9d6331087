//! Application-only OAuth2 (client-credentials) token exchange.
//!
//! Public installed-client pattern: HTTP Basic auth with the app client id and
//! an empty secret, form-encoded `grant_type` + `device_id` body. The token is
//! fetched once per retrieval run and never refreshed.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint rate limited the request (HTTP 429): {body}")]
    RateLimited { body: String },

    #[error("token endpoint returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse token response: {source} (body: {body})")]
    Parse {
        source: serde_json::Error,
        body: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Bearer credential attached to every listing request.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
}

impl OAuthToken {
    /// Value for the `Authorization` header, e.g. `bearer <token>`.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Perform the client-credentials exchange. No retry; a failure here aborts
/// the whole retrieval.
pub async fn request_token(client: &Client, config: &Config) -> Result<OAuthToken, AuthError> {
    let response = client
        .post(&config.reddit_access_token_url)
        .basic_auth(&config.reddit_app_client_id, Some(""))
        .header(reqwest::header::USER_AGENT, config.user_agent())
        .form(&[
            ("grant_type", config.reddit_grant_type_header.as_str()),
            ("device_id", config.reddit_device_id_header.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if status.as_u16() == 429 {
        return Err(AuthError::RateLimited { body });
    }
    if !status.is_success() {
        return Err(AuthError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let token: OAuthToken =
        serde_json::from_str(&body).map_err(|source| AuthError::Parse { source, body })?;
    tracing::debug!(token_type = %token.token_type, expires_in = token.expires_in, "Obtained OAuth token");
    Ok(token)
}
