//! Session id → running conversation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pharmadock_common::ChatReply;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::conversation::{ChatServices, Conversation, ConversationSettings};
use crate::replies;
use crate::session::{SessionHandle, Turn};

/// How long ending a conversation waits for an in-flight turn.
pub const END_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("conversation ended before replying")]
    Closed,
}

impl ChatError {
    /// The reply body the chat endpoint sends for this failure.
    pub fn to_reply(&self) -> ChatReply {
        match self {
            ChatError::Timeout(_) => ChatReply::error(replies::REPLY_TIMEOUT),
            ChatError::Closed => ChatReply::error(replies::GENERIC_ERROR),
        }
    }
}

struct Entry {
    generation: u64,
    handle: SessionHandle,
}

type Sessions = Arc<Mutex<HashMap<String, Entry>>>;

/// Remove `session_id` if it still maps to the conversation of `generation`.
async fn forget(sessions: &Mutex<HashMap<String, Entry>>, session_id: &str, generation: u64) -> Option<SessionHandle> {
    let mut sessions = sessions.lock().await;
    if sessions.get(session_id).is_some_and(|e| e.generation == generation) {
        sessions.remove(session_id).map(|e| e.handle)
    } else {
        None
    }
}

/// Session id → running conversation.
///
/// The map lock is only held for lookups and inserts; queueing a turn and
/// waiting for its reply happen outside it. A conversation that ends on its
/// own removes its entry.
pub struct SessionRegistry {
    services: Arc<ChatServices>,
    settings: ConversationSettings,
    reply_timeout: Duration,
    sessions: Sessions,
    next_generation: AtomicU64,
}

impl SessionRegistry {
    pub fn new(services: Arc<ChatServices>, settings: ConversationSettings, reply_timeout: Duration) -> Self {
        Self {
            services,
            settings,
            reply_timeout,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub async fn active_sessions(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, e| !e.handle.is_closed());
        sessions.len()
    }

    pub async fn is_active(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).is_some_and(|e| !e.handle.is_closed())
    }

    fn spawn(&self, session_id: &str) -> Entry {
        info!(session = %session_id, "starting new conversation");
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let conversation = Conversation::new(Arc::clone(&self.services), self.settings);

        let sessions = Arc::clone(&self.sessions);
        let id = session_id.to_string();
        let on_exit = Box::new(move || {
            tokio::spawn(async move {
                if forget(&sessions, &id, generation).await.is_some() {
                    debug!(session = %id, "ended conversation removed");
                }
            });
        });
        Entry { generation, handle: SessionHandle::spawn(session_id.to_string(), conversation, on_exit) }
    }

    /// The running conversation's sender, starting one when none is running.
    async fn sender_for(&self, session_id: &str) -> (u64, mpsc::Sender<Turn>, bool) {
        let mut sessions = self.sessions.lock().await;
        if let Some(entry) = sessions.get(session_id).filter(|e| !e.handle.is_closed()) {
            return (entry.generation, entry.handle.sender(), false);
        }
        let entry = self.spawn(session_id);
        let found = (entry.generation, entry.handle.sender(), true);
        sessions.insert(session_id.to_string(), entry);
        found
    }

    /// Send `prompt` to the session's conversation, starting one when none
    /// is running, and wait for the reply.
    pub async fn send(&self, session_id: &str, prompt: &str) -> Result<ChatReply, ChatError> {
        let (tx, rx) = oneshot::channel();
        let mut turn = Turn { prompt: prompt.to_string(), reply: tx };
        let mut created = None;

        for _ in 0..2 {
            let (generation, sender, fresh) = self.sender_for(session_id).await;
            match sender.send(turn).await {
                Ok(()) => {
                    created = fresh.then_some(generation);
                    break;
                }
                Err(returned) => {
                    debug!(session = %session_id, "conversation ended while queueing, restarting");
                    forget(&self.sessions, session_id, generation).await;
                    turn = returned.0;
                }
            }
        }

        match tokio::time::timeout(self.reply_timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => {
                warn!(session = %session_id, "conversation ended without replying");
                Err(ChatError::Closed)
            }
            Err(_) => {
                warn!(session = %session_id, "reply timeout after {:?}", self.reply_timeout);
                if let Some(generation) = created {
                    if let Some(handle) = forget(&self.sessions, session_id, generation).await {
                        handle.stop(Duration::ZERO).await;
                    }
                }
                Err(ChatError::Timeout(self.reply_timeout))
            }
        }
    }

    /// Stop and forget the session's conversation, if any.
    pub async fn end(&self, session_id: &str) {
        let entry = self.sessions.lock().await.remove(session_id);
        if let Some(entry) = entry {
            info!(session = %session_id, "ending conversation");
            entry.handle.stop(END_GRACE).await;
        }
    }
}
