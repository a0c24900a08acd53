//! A conversation running as its own task.

use std::time::Duration;

use pharmadock_common::ChatReply;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::conversation::Conversation;

/// One user message and where to send the reply.
pub struct Turn {
    pub prompt: String,
    pub reply: oneshot::Sender<ChatReply>,
}

/// Runs once the conversation task has ended on its own.
pub type OnExit = Box<dyn FnOnce() + Send>;

/// Queue depth per conversation.
pub const TURN_QUEUE: usize = 8;

pub struct SessionHandle {
    turns: mpsc::Sender<Turn>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Spawn the task driving `conversation`. It ends once no turn arrives
    /// within the conversation's idle timeout or every sender is dropped,
    /// then calls `on_exit`.
    pub fn spawn(session_id: String, conversation: Conversation, on_exit: OnExit) -> Self {
        let (turns, rx) = mpsc::channel(TURN_QUEUE);
        let task = tokio::spawn(async move {
            run(session_id, conversation, rx).await;
            on_exit();
        });
        Self { turns, task }
    }

    /// A sender for queueing turns without holding on to the handle.
    pub fn sender(&self) -> mpsc::Sender<Turn> {
        self.turns.clone()
    }

    /// Whether the task stopped taking turns.
    pub fn is_closed(&self) -> bool {
        self.turns.is_closed()
    }

    /// Queue a turn. Hands the turn back if the task has ended.
    pub async fn submit(&self, turn: Turn) -> Result<(), Turn> {
        self.turns.send(turn).await.map_err(|e| e.0)
    }

    /// Resolves once the task has ended.
    pub async fn closed(&self) {
        self.turns.closed().await
    }

    /// Stop taking turns and wait up to `grace` for the current one to
    /// finish; the task is aborted after that.
    pub async fn stop(self, grace: Duration) {
        let Self { turns, mut task } = self;
        drop(turns);
        if tokio::time::timeout(grace, &mut task).await.is_err() {
            debug!("Conversation did not finish in {:?}, aborting", grace);
            task.abort();
        }
    }
}

async fn run(session_id: String, mut conversation: Conversation, mut rx: mpsc::Receiver<Turn>) {
    let idle = conversation.settings().idle_timeout;
    debug!(session = %session_id, "conversation started");

    loop {
        let turn = match tokio::time::timeout(idle, rx.recv()).await {
            Ok(Some(turn)) => turn,
            Ok(None) => break,
            Err(_) => {
                info!(session = %session_id, "Conversation timeout, ending");
                break;
            }
        };

        let reply = conversation.handle_turn(&turn.prompt).await;
        if turn.reply.send(reply).is_err() {
            debug!(session = %session_id, "caller stopped waiting for the reply");
        }
    }

    rx.close();
    debug!(session = %session_id, stage = %conversation.stage(), "conversation ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ChatServices, ConversationSettings};
    use crate::testing::{catalogs, FakeDocking, FakeLlm};
    use std::sync::Arc;

    fn handle(idle: Duration) -> SessionHandle {
        let services = Arc::new(ChatServices {
            llm: Arc::new(FakeLlm::new().gene_drug("EGFR", "Aspirin")),
            docking: FakeDocking::ok(),
            catalogs: Arc::new(catalogs()),
        });
        let settings = ConversationSettings { idle_timeout: idle, ..Default::default() };
        SessionHandle::spawn("s1".to_string(), Conversation::new(services, settings), Box::new(|| {}))
    }

    async fn ask(handle: &SessionHandle, prompt: &str) -> ChatReply {
        let (tx, rx) = oneshot::channel();
        handle.submit(Turn { prompt: prompt.to_string(), reply: tx }).await.ok().unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_turns_are_answered_in_order() {
        let h = handle(Duration::from_secs(300));
        assert!(!ask(&h, "EGFR and aspirin").await.is_error());
        assert!(!ask(&h, "defaults please").await.is_error());
        h.stop(Duration::from_secs(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_conversation_ends() {
        let h = handle(Duration::from_secs(300));
        assert!(!h.is_closed());
        let ended = tokio::time::timeout(Duration::from_secs(301), h.closed()).await;
        assert!(ended.is_ok());
        assert!(h.is_closed());

        let (tx, _rx) = oneshot::channel();
        assert!(h.submit(Turn { prompt: "late".to_string(), reply: tx }).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_hook_runs_after_idle_timeout() {
        let services = Arc::new(ChatServices {
            llm: Arc::new(FakeLlm::new()),
            docking: FakeDocking::ok(),
            catalogs: Arc::new(catalogs()),
        });
        let (done_tx, done_rx) = oneshot::channel();
        let h = SessionHandle::spawn(
            "s2".to_string(),
            Conversation::new(services, ConversationSettings::default()),
            Box::new(move || {
                let _ = done_tx.send(());
            }),
        );
        assert!(tokio::time::timeout(Duration::from_secs(301), done_rx).await.is_ok());
        assert!(h.is_closed());
    }
}
