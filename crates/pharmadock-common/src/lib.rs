//! pharmadock-common: Shared types, errors, and helpers used across all PharmaDock crates.

pub mod error;
pub mod chat;
pub mod paths;

// Re-export commonly used types
pub use chat::{AssistantContent, ChatReply, ChatRequest, DockingFiles, FileReference};
pub use error::{PharmaDockError, Result};
