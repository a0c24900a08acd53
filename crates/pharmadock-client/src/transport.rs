//! HTTP side of the client: the chat endpoint, docking file retrieval,
//! log downloads, and the static demo assets on disk.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use pharmadock_common::paths::resolve_under;
use pharmadock_common::{ChatReply, ChatRequest, FileReference};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, Url};
use tracing::debug;

use crate::conversation::ChatTransport;
use crate::csrf::read_csrf_token;
use crate::download::{DownloadRequest, Downloader};
use crate::error::{ClientError, Result};
use crate::viewer::TextSource;

pub const CSRF_HEADER: &str = "X-CSRFToken";

const CHAT_PAGE: &str = "chat/";
const MESSAGE_ENDPOINT: &str = "chat/message/";
const END_ENDPOINT: &str = "chat/end/";
const FILE_ENDPOINT: &str = "chat/get-docking-file/";

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status { status: status.as_u16(), url: response.url().to_string() });
    }
    Ok(response)
}

/// A cookie-holding client for one PharmaDock server.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    jar: Arc<Jar>,
    base: Url,
    download_dir: PathBuf,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| ClientError::Url(format!("{}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let jar = Arc::new(Jar::default());
        let client = Client::builder().cookie_provider(Arc::clone(&jar)).build()?;
        Ok(Self { client, jar, base, download_dir: PathBuf::from(".") })
    }

    /// Where downloaded logs are written.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Server root without the trailing slash.
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| ClientError::Url(format!("{}: {}", path, e)))
    }

    fn csrf_token(&self) -> Option<String> {
        self.cookie_header().as_deref().and_then(read_csrf_token)
    }

    /// Load the chat page so the server issues the session and CSRF cookies.
    pub async fn open_session(&self) -> Result<()> {
        let response = self.client.get(self.url(CHAT_PAGE)?).send().await?;
        check_status(response)?;
        debug!(server = %self.base, "chat session opened");
        Ok(())
    }

    pub async fn end_conversation(&self) -> Result<()> {
        let mut request = self.client.post(self.url(END_ENDPOINT)?);
        if let Some(token) = self.csrf_token() {
            request = request.header(CSRF_HEADER, token);
        }
        check_status(request.send().await?)?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for HttpClient {
    fn cookie_header(&self) -> Option<String> {
        let value = self.jar.cookies(&self.base)?;
        value.to_str().ok().map(str::to_string)
    }

    async fn post_message(&self, request: &ChatRequest, csrf_token: Option<&str>) -> Result<ChatReply> {
        let mut builder = self.client.post(self.url(MESSAGE_ENDPOINT)?).json(request);
        if let Some(token) = csrf_token {
            builder = builder.header(CSRF_HEADER, token);
        }
        let body = check_status(builder.send().await?)?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Structure files through `GET /chat/get-docking-file/<path>`.
#[async_trait]
impl TextSource for HttpClient {
    async fn fetch(&self, file: &FileReference) -> Result<String> {
        let url = self.url(&format!("{}{}", FILE_ENDPOINT, file.as_str().trim_start_matches('/')))?;
        let response = check_status(self.client.get(url).send().await?)?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Downloader for HttpClient {
    async fn download(&self, request: &DownloadRequest) -> Result<()> {
        let url = Url::parse(&request.url).map_err(|e| ClientError::Url(format!("{}: {}", request.url, e)))?;
        let bytes = check_status(self.client.get(url).send().await?)?.bytes().await?;
        tokio::fs::create_dir_all(&self.download_dir).await?;
        tokio::fs::write(self.download_dir.join(&request.filename), &bytes).await?;
        Ok(())
    }
}

/// Files under a local static asset directory.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TextSource for StaticAssets {
    async fn fetch(&self, file: &FileReference) -> Result<String> {
        let path = resolve_under(&self.root, file.as_str())
            .map_err(|_| ClientError::InvalidPath(file.to_string()))?;
        Ok(tokio::fs::read_to_string(path).await?)
    }
}
