// Size-bounded HTTP downloads for media, chat logs and attachments

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("{url} is {size} bytes, above the {limit} byte limit")]
    TooLarge { url: String, size: u64, limit: u64 },
    
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    
    #[error("Request to {url} failed: {message}")]
    Request {
        url: String,
        message: String,
        retryable: bool,
    },
    
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TooLarge { .. } => false,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Request { retryable, .. } => *retryable,
            Self::Io(_) => true,
        }
    }
    
    fn request(url: &str, err: reqwest::Error) -> Self {
        let retryable = err.is_timeout() || err.is_connect() || err.is_request() || err.is_body();
        Self::Request {
            url: url.to_string(),
            message: err.to_string(),
            retryable,
        }
    }
}

/// Downloaded body with the server's content type, if any
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
pub struct Downloader {
    http_client: reqwest::Client,
}

impl Downloader {
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DownloadError::Request {
                url: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
                retryable: false,
            })?;
        Ok(Self { http_client })
    }
    
    async fn start(&self, url: &str, max_bytes: u64) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::request(url, e))?;
        
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        
        if let Some(size) = response.content_length() {
            if size > max_bytes {
                return Err(DownloadError::TooLarge {
                    url: url.to_string(),
                    size,
                    limit: max_bytes,
                });
            }
        }
        Ok(response)
    }
    
    /// Fetch into memory, rejecting bodies above `max_bytes` whether reported or actual
    pub async fn fetch_bytes(&self, url: &str, max_bytes: u64) -> Result<Fetched, DownloadError> {
        let mut response = self.start(url, max_bytes).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DownloadError::request(url, e))?
        {
            if (bytes.len() + chunk.len()) as u64 > max_bytes {
                return Err(DownloadError::TooLarge {
                    url: url.to_string(),
                    size: (bytes.len() + chunk.len()) as u64,
                    limit: max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        
        Ok(Fetched { bytes, content_type })
    }
    
    /// Stream into a temporary file that is deleted when the handle drops
    pub async fn fetch_to_temp(
        &self,
        url: &str,
        max_bytes: u64,
        dir: Option<&Path>,
    ) -> Result<NamedTempFile, DownloadError> {
        let mut response = self.start(url, max_bytes).await?;
        
        let suffix = media_suffix(url);
        let mut builder = tempfile::Builder::new();
        builder.prefix("recap-media-").suffix(&suffix);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DownloadError::request(url, e))?
        {
            written += chunk.len() as u64;
            if written > max_bytes {
                return Err(DownloadError::TooLarge {
                    url: url.to_string(),
                    size: written,
                    limit: max_bytes,
                });
            }
            file.write_all(&chunk)?;
        }
        file.flush()?;
        
        tracing::debug!(url, bytes = written, path = %file.path().display(), "Media downloaded");
        Ok(file)
    }
}

/// File extension of the URL path (providers sniff the format from it), `.mp4` otherwise
fn media_suffix(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => ".mp4".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_media_suffix() {
        assert_eq!(media_suffix("https://cdn.example.com/a/rec.MP3?sig=1"), ".mp3");
        assert_eq!(media_suffix("https://cdn.example.com/a/recording"), ".mp4");
        assert_eq!(media_suffix("https://cdn.example.com/a/rec.webm#t=3"), ".webm");
    }

    #[tokio::test]
    async fn test_reported_size_rejected_before_writing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/big.mp4")
            .with_status(200)
            .with_body(vec![0u8; 4096])
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let downloader = Downloader::new(Duration::from_secs(5)).unwrap();
        let err = downloader
            .fetch_to_temp(&format!("{}/big.mp4", server.url()), 1024, Some(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::TooLarge { size: 4096, limit: 1024, .. }));
        assert!(!err.is_retryable());
        assert_eq!(temp_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_streamed_size_rejected_and_file_removed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/chunked.mp4")
            .with_status(200)
            .with_chunked_body(|w| w.write_all(&[1u8; 4096]))
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let downloader = Downloader::new(Duration::from_secs(5)).unwrap();
        let err = downloader
            .fetch_to_temp(&format!("{}/chunked.mp4", server.url()), 1024, Some(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::TooLarge { .. }));
        assert_eq!(temp_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_fetch_to_temp_keeps_file_until_drop() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/small.mp4")
            .with_status(200)
            .with_body("tiny video")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let downloader = Downloader::new(Duration::from_secs(5)).unwrap();
        let file = downloader
            .fetch_to_temp(&format!("{}/small.mp4", server.url()), 1024, Some(dir.path()))
            .await
            .unwrap();

        assert_eq!(std::fs::read(file.path()).unwrap(), b"tiny video");
        assert!(file.path().extension().is_some_and(|e| e == "mp4"));
        drop(file);
        assert_eq!(temp_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/gone.txt").with_status(404).create_async().await;

        let downloader = Downloader::new(Duration::from_secs(5)).unwrap();
        let err = downloader
            .fetch_bytes(&format!("{}/gone.txt", server.url()), 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status { status: 404, .. }));
        assert!(!err.is_retryable());
    }
}
