//! HTTP downloader for source assets.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use overlay_media::artifact::{remove_quietly, unique_path};

use crate::collaborators::{DownloadedFile, Downloader};
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// Streams `http(s)://` and `file://` URLs into the work directory.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    work_dir: PathBuf,
    max_bytes: u64,
}

impl HttpDownloader {
    pub fn new(work_dir: impl Into<PathBuf>, max_bytes: u64, timeout: Duration) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::download(None, format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            work_dir: work_dir.into(),
            max_bytes,
        })
    }

    /// Use a preconfigured client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn fetch_http(&self, url: &Url) -> PipelineResult<DownloadedFile> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PipelineError::download(None, format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::download(None, format!("HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(PipelineError::download(
                    None,
                    format!("File too large: {len} bytes (max {})", self.max_bytes),
                ));
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let ext = extension_for(url, content_type.as_deref());
        let path = unique_path(&self.work_dir, "source", &ext);

        match self.stream_to_file(response, &path).await {
            Ok(size) => Ok(DownloadedFile {
                path,
                content_type,
                size,
            }),
            Err(e) => {
                remove_quietly(&path).await;
                Err(e)
            }
        }
    }

    async fn stream_to_file(&self, response: reqwest::Response, path: &Path) -> PipelineResult<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let data =
                chunk.map_err(|e| PipelineError::download(None, format!("Read failed: {e}")))?;
            written += data.len() as u64;
            if written > self.max_bytes {
                return Err(PipelineError::download(
                    None,
                    format!("File too large: exceeds {} bytes", self.max_bytes),
                ));
            }
            file.write_all(&data).await?;
        }
        file.flush().await?;

        Ok(written)
    }

    async fn fetch_file(&self, url: &Url) -> PipelineResult<DownloadedFile> {
        let source = url
            .to_file_path()
            .map_err(|_| PipelineError::download(None, "Invalid file URL"))?;

        let size = tokio::fs::metadata(&source)
            .await
            .map_err(|e| PipelineError::download(None, format!("{}: {e}", source.display())))?
            .len();
        if size > self.max_bytes {
            return Err(PipelineError::download(
                None,
                format!("File too large: {size} bytes (max {})", self.max_bytes),
            ));
        }

        let path = unique_path(&self.work_dir, "source", &extension_for(url, None));
        if let Err(e) = tokio::fs::copy(&source, &path).await {
            remove_quietly(&path).await;
            return Err(PipelineError::download(None, format!("Copy failed: {e}")));
        }

        Ok(DownloadedFile {
            path,
            content_type: None,
            size,
        })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str) -> PipelineResult<DownloadedFile> {
        let parsed = Url::parse(url)
            .map_err(|e| PipelineError::download(None, format!("Invalid URL '{url}': {e}")))?;

        tokio::fs::create_dir_all(&self.work_dir).await?;

        let start = Instant::now();
        debug!(url = %parsed, "Downloading");

        let file = match parsed.scheme() {
            "http" | "https" => self.fetch_http(&parsed).await?,
            "file" => self.fetch_file(&parsed).await?,
            other => {
                return Err(PipelineError::download(
                    None,
                    format!("Unsupported URL scheme: {other}"),
                ))
            }
        };

        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_download(file.size, elapsed);
        info!(
            url = %parsed,
            path = %file.path.display(),
            size = file.size,
            elapsed_secs = elapsed,
            "Downloaded source"
        );

        Ok(file)
    }
}

/// File extension for a download: the URL's own, else one implied by the
/// content type, else `bin`.
pub fn extension_for(url: &Url, content_type: Option<&str>) -> String {
    let from_path = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 5);

    if let Some(ext) = from_path {
        return ext;
    }

    match content_type {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("video/mp4") => "mp4",
        Some("video/quicktime") => "mov",
        Some("video/webm") => "webm",
        Some("video/x-matroska") => "mkv",
        _ => "bin",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader(dir: &Path, max_bytes: u64) -> HttpDownloader {
        HttpDownloader::new(dir, max_bytes, Duration::from_secs(10)).unwrap()
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_extension_for() {
        let url = Url::parse("https://cdn.example.com/a/clip.MP4?sig=1").unwrap();
        assert_eq!(extension_for(&url, None), "mp4");

        let url = Url::parse("https://cdn.example.com/a/asset").unwrap();
        assert_eq!(extension_for(&url, Some("image/png")), "png");
        assert_eq!(extension_for(&url, Some("application/octet-stream")), "bin");
    }

    #[tokio::test]
    async fn test_download_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(vec![7u8; 2048]),
            )
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let file = downloader(dir.path(), 1 << 20)
            .fetch(&format!("{}/clip.mp4", server.uri()))
            .await
            .unwrap();

        assert_eq!(file.size, 2048);
        assert_eq!(file.content_type.as_deref(), Some("video/mp4"));
        assert!(file.path.extension().unwrap() == "mp4");
        assert_eq!(std::fs::metadata(&file.path).unwrap().len(), 2048);
    }

    #[tokio::test]
    async fn test_http_error_leaves_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let err = downloader(dir.path(), 1 << 20)
            .fetch(&format!("{}/missing.mp4", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Download { .. }));
        assert!(err.to_string().contains("404"));
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_oversized_download_removed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let err = downloader(dir.path(), 1024)
            .fetch(&format!("{}/big.png", server.uri()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("too large"));
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_file_url_is_copied() {
        let src_dir = tempfile::TempDir::new().unwrap();
        let src = src_dir.path().join("photo.png");
        std::fs::write(&src, b"png bytes").unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let url = Url::from_file_path(&src).unwrap();
        let file = downloader(dir.path(), 1 << 20)
            .fetch(url.as_str())
            .await
            .unwrap();

        assert_eq!(file.size, 9);
        assert!(file.path.starts_with(dir.path()));
        assert!(src.exists());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let d = downloader(dir.path(), 1024);
        assert!(d.fetch("not a url").await.is_err());
        assert!(d.fetch("ftp://example.com/a.mp4").await.is_err());
    }
}
