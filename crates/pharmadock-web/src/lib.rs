//! pharmadock-web: HTTP front of PharmaDock.
//! Serves:
//!   - the landing page and the chat page
//!   - the chat endpoint driving per-session docking conversations
//!   - docking structure and log downloads
//!   - static assets (demo structures)

pub mod cookies;
pub mod handlers;
pub mod router;
pub mod state;
pub mod templates;

use tracing::info;

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: state::AppState, addr: &str) -> anyhow::Result<()> {
    let app = router::build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("PharmaDock listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
