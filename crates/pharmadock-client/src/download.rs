//! Docking log downloads.

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::Result;

pub const LOG_ENDPOINT: &str = "/chat/get-docking-log/";

/// A file to fetch and the name to save it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub filename: String,
}

impl DownloadRequest {
    /// Request for a docking log stored at `path` on the server at `base_url`.
    pub fn for_log(base_url: &str, path: &str) -> Self {
        let path = path.trim_start_matches('/');
        let filename = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            url: format!("{}{}{}", base_url.trim_end_matches('/'), LOG_ENDPOINT, path),
            filename,
        }
    }
}

#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, request: &DownloadRequest) -> Result<()>;
}

/// Start a log download. Failures are logged, never returned.
pub async fn trigger_download(downloader: &dyn Downloader, base_url: &str, path: &str) {
    let request = DownloadRequest::for_log(base_url, path);
    match downloader.download(&request).await {
        Ok(()) => info!(file = %request.filename, "Downloaded docking log"),
        Err(e) => error!(url = %request.url, "Download failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<DownloadRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl Downloader for Recorder {
        async fn download(&self, request: &DownloadRequest) -> Result<()> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ClientError::Status { status: 404, url: request.url.clone() });
            }
            Ok(())
        }
    }

    #[test]
    fn test_filename_is_last_segment() {
        let req = DownloadRequest::for_log("http://localhost:8000", "abc/def/out.log");
        assert_eq!(req.filename, "out.log");
        assert_eq!(req.url, "http://localhost:8000/chat/get-docking-log/abc/def/out.log");
    }

    #[test]
    fn test_bare_name_and_trailing_slash_base() {
        let req = DownloadRequest::for_log("http://h/", "run_vina.log");
        assert_eq!(req.url, "http://h/chat/get-docking-log/run_vina.log");
        assert_eq!(req.filename, "run_vina.log");
    }

    #[tokio::test]
    async fn test_trigger_swallows_errors() {
        let rec = Recorder { fail: true, ..Default::default() };
        trigger_download(&rec, "http://h", "a/b.log").await;
        assert_eq!(rec.seen.lock().unwrap().len(), 1);
    }
}
