//! Chat endpoints.

use axum::{body::Bytes, extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use pharmadock_chat::replies;
use pharmadock_common::{ChatReply, ChatRequest};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::cookies::{ensure_session, session_id};
use crate::state::SharedState;

/// `POST /chat/message/`: one conversation turn.
pub async fn chat_message(
    State(state): State<SharedState>,
    jar: CookieJar,
    body: Bytes,
) -> (CookieJar, Json<ChatReply>) {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed chat request: {}", e);
            return (jar, Json(ChatReply::error(replies::GENERIC_ERROR)));
        }
    };

    let (jar, session) = ensure_session(jar);
    debug!(session = %session, "chat message received");

    let reply = match state.registry.send(&session, &request.user_prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(session = %session, "chat turn failed: {}", e);
            e.to_reply()
        }
    };
    (jar, Json(reply))
}

/// `POST /chat/end/`
pub async fn end_conversation(State(state): State<SharedState>, jar: CookieJar) -> Json<Value> {
    if let Some(session) = session_id(&jar) {
        state.registry.end(&session).await;
    }
    Json(json!({ "status": "success" }))
}
