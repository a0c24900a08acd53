//! pharmadock-chat: per-session docking conversations.
//!
//! A conversation walks the user from a gene/drug question to a finished
//! docking run:
//!   GeneDrug → (PdbSelection) → Options → Docking → GeneDrug
//! Each session's conversation runs as its own tokio task; the
//! [`SessionRegistry`] routes turns to it and bounds how long a caller waits.

pub mod stage;
pub mod options;
pub mod conversation;
pub mod session;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use conversation::{Conversation, ConversationSettings, ChatServices};
pub use registry::SessionRegistry;
pub use stage::{DockingContext, Stage};

/// Reply texts surfaced to the user.
pub mod replies {
    pub const EXTRACTION_TIMEOUT: &str = "Response timeout, Try again later";
    pub const PROCESSING_ERROR: &str =
        "Error at proccessing the petition. Please, try later or contact with the administrator";
    pub const DOCKING_ERROR: &str =
        "There's been an error while executing the docking. Please, try again later or contact with the administrator";
    pub const REPLY_TIMEOUT: &str = "The response is taking a lot of time. Please try again";
    pub const GENERIC_ERROR: &str =
        "There's been an error. Please, try later or contact with the administrator";
}
