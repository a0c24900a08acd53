//! Wire types for the chat endpoint, shared by the server and the client.
//!
//! `POST /chat/message/` takes a [`ChatRequest`] and answers with a
//! [`ChatReply`]: either `{ "error": ... }` or the assistant content with
//! optional docking artefact paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /chat/message/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_prompt: String,
}

impl ChatRequest {
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self { user_prompt: user_prompt.into() }
    }
}

/// Opaque server-relative path of a stored structure or log file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileReference(String);

impl FileReference {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment, used as the displayed/download file name.
    pub fn file_name(&self) -> &str {
        self.0.rsplit(['/', '\\']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileReference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The three structure files a viewer load needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockingFiles {
    pub receptor: FileReference,
    pub ligand: FileReference,
    pub pose: FileReference,
}

/// Successful assistant turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantContent {
    /// Markdown text.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docking_result_log: Option<FileReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receptor_file: Option<FileReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ligand_file: Option<FileReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_file: Option<FileReference>,
}

impl AssistantContent {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), ..Default::default() }
    }

    /// All three structure references, or `None` if any is missing.
    pub fn docking_files(&self) -> Option<DockingFiles> {
        match (&self.receptor_file, &self.ligand_file, &self.pos_file) {
            (Some(receptor), Some(ligand), Some(pose)) => Some(DockingFiles {
                receptor: receptor.clone(),
                ligand: ligand.clone(),
                pose: pose.clone(),
            }),
            _ => None,
        }
    }
}

/// Response body of `POST /chat/message/`.
///
/// Untagged: a body carrying `error` always decodes as [`ChatReply::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatReply {
    Error { error: String },
    Content(AssistantContent),
}

impl ChatReply {
    pub fn error(message: impl Into<String>) -> Self {
        ChatReply::Error { error: message.into() }
    }

    pub fn content(content: impl Into<String>) -> Self {
        ChatReply::Content(AssistantContent::text(content))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ChatReply::Error { .. })
    }
}
