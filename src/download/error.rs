use thiserror::Error;

/// Download failures. Any one of these aborts the whole current batch; there
/// is no per-image recovery.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("unknown file type for image with url: {url}")]
    UnknownFileType { url: String },

    #[error("image request for '{url}' returned HTTP {status}")]
    HttpStatus { status: u16, url: String },

    #[error("failed to download '{url}': {source}")]
    Http {
        source: reqwest::Error,
        url: String,
    },

    #[error("failed to save image to '{path}': {source}")]
    Disk {
        path: String,
        source: std::io::Error,
    },
}
