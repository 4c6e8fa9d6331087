//! Image download: an unauthenticated GET against the CDN, streamed straight
//! to disk. Listing payloads HTML-escape their URLs, so the URL is unescaped
//! before the request goes out.

pub mod error;

use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

pub use error::DownloadError;

use crate::reddit::listing::Candidate;

/// Undo the HTML entity escaping applied to URLs in listing payloads.
/// Only the five standard entities occur there.
fn unescape_html(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Download one accepted candidate into `download_dir`, returning the
/// filename written. The target file is created fresh (overwrite if present)
/// and the body is streamed, never buffered whole.
pub async fn save_image(
    client: &Client,
    candidate: &Candidate,
    download_dir: &Path,
) -> Result<String, DownloadError> {
    let filename = candidate
        .file_name()
        .ok_or_else(|| DownloadError::UnknownFileType {
            url: candidate.url.clone(),
        })?;
    let file_path = download_dir.join(&filename);
    let url = unescape_html(&candidate.url);

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| DownloadError::Http {
            source,
            url: url.clone(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::HttpStatus {
            status: status.as_u16(),
            url,
        });
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&file_path)
        .await
        .map_err(|source| DownloadError::Disk {
            path: file_path.display().to_string(),
            source,
        })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| DownloadError::Http {
            source,
            url: url.clone(),
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|source| DownloadError::Disk {
                path: file_path.display().to_string(),
                source,
            })?;
    }
    file.flush().await.map_err(|source| DownloadError::Disk {
        path: file_path.display().to_string(),
        source,
    })?;

    tracing::info!(title = %candidate.title, "Successfully saved image to '{}'", file_path.display());
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate(url: String) -> Candidate {
        Candidate {
            uid: "t3_xyz".to_string(),
            title: "Dunes".to_string(),
            url,
            width: 1920,
            height: 1080,
        }
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(
            unescape_html("https://i.example/a.jpg?x=1&amp;y=2"),
            "https://i.example/a.jpg?x=1&y=2"
        );
        assert_eq!(unescape_html("no entities"), "no entities");
        assert_eq!(unescape_html("&lt;&gt;&quot;&#39;"), "<>\"'");
    }

    #[tokio::test]
    async fn test_save_image_writes_bytes_to_disk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/t3_xyz.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake image bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();
        let c = candidate(format!("{}/img/t3_xyz.jpg", server.uri()));

        let filename = save_image(&client, &c, dir.path()).await.unwrap();
        assert_eq!(filename, "t3_xyz.jpg");
        let written = std::fs::read(dir.path().join("t3_xyz.jpg")).unwrap();
        assert_eq!(written, b"fake image bytes");
    }

    #[tokio::test]
    async fn test_save_image_unescapes_url_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/t3_xyz.jpg"))
            .and(query_param("x", "1"))
            .and(query_param("y", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();
        let c = candidate(format!("{}/img/t3_xyz.jpg?x=1&amp;y=2", server.uri()));
        save_image(&client, &c, dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_image_overwrites_existing_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t3_xyz.jpg"), b"old contents, longer").unwrap();

        let client = Client::new();
        let c = candidate(format!("{}/img/t3_xyz.jpg", server.uri()));
        save_image(&client, &c, dir.path()).await.unwrap();
        let written = std::fs::read(dir.path().join("t3_xyz.jpg")).unwrap();
        assert_eq!(written, b"new");
    }

    #[tokio::test]
    async fn test_save_image_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();
        let c = candidate(format!("{}/img/t3_xyz.jpg", server.uri()));
        let err = save_image(&client, &c, dir.path()).await.unwrap_err();
        assert!(matches!(err, DownloadError::HttpStatus { status: 404, .. }));
        assert!(!dir.path().join("t3_xyz.jpg").exists());
    }

    #[tokio::test]
    async fn test_save_image_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();
        let c = candidate("https://i.example/t3_xyz.tiff".to_string());
        let err = save_image(&client, &c, dir.path()).await.unwrap_err();
        assert!(matches!(err, DownloadError::UnknownFileType { .. }));
    }

    #[tokio::test]
    async fn test_save_image_unwritable_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let client = Client::new();
        let c = candidate(format!("{}/img/t3_xyz.jpg", server.uri()));
        let err = save_image(&client, &c, Path::new("/nonexistent-dir"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Disk { .. }));
    }
}
