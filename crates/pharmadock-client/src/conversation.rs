//! The chat panel: one user turn at a time through the server.
//!
//! Each non-blank turn shows the user bubble and a loading placeholder,
//! posts the prompt and swaps the placeholder for the outcome. Content
//! replies are rendered from markdown, may carry a log download, and start a
//! viewer load when all three structure files are present.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pharmadock_common::{AssistantContent, ChatReply, ChatRequest, DockingFiles, FileReference};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::csrf::read_csrf_token;
use crate::download::DownloadRequest;
use crate::error::Result;
use crate::markdown::MarkdownRenderer;
use crate::viewer::loader::{LoadOutcome, ViewerLoader};
use crate::viewer::ViewerContainer;

/// Posts chat turns to the server.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Current `Cookie` header for the server, if any cookies are held.
    fn cookie_header(&self) -> Option<String>;
    async fn post_message(&self, request: &ChatRequest, csrf_token: Option<&str>) -> Result<ChatReply>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BubbleId(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bubble {
    User(String),
    Placeholder { id: String },
    Assistant { html: String, download: Option<DownloadRequest> },
    /// Markdown could not be converted; shown as plain text.
    Raw { text: String, download: Option<DownloadRequest> },
    Error(String),
    NetworkError(String),
}

/// The message list and the input box.
pub trait ConversationView: Send {
    fn append(&mut self, bubble: Bubble) -> BubbleId;
    fn remove(&mut self, id: &BubbleId);
    fn clear_input(&mut self);
    fn scroll_to_latest(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockingAttachments {
    pub log: Option<FileReference>,
    pub files: Option<DockingFiles>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub attachments: Option<DockingAttachments>,
    pub is_error: bool,
}

/// Append-only record of the session's resolved messages.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<ChatMessage>,
}

impl ConversationLog {
    fn push(&mut self, message: ChatMessage) {
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub enum TurnOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Content shown. `viewer` is the structure load it started, if any.
    Replied { viewer: Option<JoinHandle<LoadOutcome>> },
    /// The server answered with an error message.
    Rejected(String),
    NetworkError(String),
}

pub struct ChatController<V: ConversationView> {
    view: V,
    transport: Arc<dyn ChatTransport>,
    markdown: Arc<dyn MarkdownRenderer>,
    loader: Arc<ViewerLoader>,
    container: Arc<dyn ViewerContainer>,
    base_url: String,
    log: ConversationLog,
    placeholders: u64,
}

impl<V: ConversationView> ChatController<V> {
    pub fn new(
        view: V,
        transport: Arc<dyn ChatTransport>,
        markdown: Arc<dyn MarkdownRenderer>,
        loader: Arc<ViewerLoader>,
        container: Arc<dyn ViewerContainer>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            view,
            transport,
            markdown,
            loader,
            container,
            base_url: base_url.into(),
            log: ConversationLog::default(),
            placeholders: 0,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    fn placeholder_id(&mut self) -> String {
        self.placeholders += 1;
        format!("loading-{}-{}", Utc::now().timestamp_millis(), self.placeholders)
    }

    /// Run one turn for `input`.
    pub async fn send(&mut self, input: &str) -> TurnOutcome {
        let prompt = input.trim();
        if prompt.is_empty() {
            return TurnOutcome::Ignored;
        }

        self.view.append(Bubble::User(prompt.to_string()));
        self.log.push(ChatMessage { role: Role::User, text: prompt.to_string(), attachments: None, is_error: false });
        let id = self.placeholder_id();
        let placeholder = self.view.append(Bubble::Placeholder { id });
        self.view.scroll_to_latest();

        let token = self.transport.cookie_header().as_deref().and_then(read_csrf_token);
        if token.is_none() {
            debug!("no CSRF token cookie held, posting without one");
        }
        let result = self.transport.post_message(&ChatRequest::new(prompt), token.as_deref()).await;
        self.view.remove(&placeholder);

        let outcome = match result {
            Ok(ChatReply::Content(content)) => self.show_content(content),
            Ok(ChatReply::Error { error }) => {
                self.view.append(Bubble::Error(error.clone()));
                self.log_error(&error);
                TurnOutcome::Rejected(error)
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                let text = e.to_string();
                self.view.append(Bubble::NetworkError(text.clone()));
                self.log_error(&text);
                TurnOutcome::NetworkError(text)
            }
        };

        self.view.clear_input();
        self.view.scroll_to_latest();
        outcome
    }

    fn log_error(&mut self, text: &str) {
        self.log.push(ChatMessage { role: Role::Assistant, text: text.to_string(), attachments: None, is_error: true });
    }

    fn show_content(&mut self, content: AssistantContent) -> TurnOutcome {
        let download = content
            .docking_result_log
            .as_ref()
            .map(|log| DownloadRequest::for_log(&self.base_url, log.as_str()));
        let bubble = match self.markdown.to_html(&content.content) {
            Ok(html) => Bubble::Assistant { html, download },
            Err(e) => {
                warn!("Markdown conversion failed, showing raw text: {}", e);
                Bubble::Raw { text: content.content.clone(), download }
            }
        };
        self.view.append(bubble);

        let files = content.docking_files();
        let viewer = files.clone().map(|files| {
            let loader = Arc::clone(&self.loader);
            let container = Arc::clone(&self.container);
            tokio::spawn(async move { loader.load(container.as_ref(), &files).await })
        });

        let attachments = (content.docking_result_log.is_some() || files.is_some())
            .then(|| DockingAttachments { log: content.docking_result_log.clone(), files });
        self.log.push(ChatMessage { role: Role::Assistant, text: content.content, attachments, is_error: false });
        TurnOutcome::Replied { viewer }
    }
}
