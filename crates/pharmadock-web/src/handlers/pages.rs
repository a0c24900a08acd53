//! HTML pages. Rendering a page also issues the session and CSRF cookies.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Html,
};
use axum_extra::extract::cookie::CookieJar;
use minijinja::{context, Value};
use tracing::error;

use crate::cookies::ensure_cookies;
use crate::state::SharedState;

/// Demo structures under `/static`, linked from the landing page.
pub const DEMO_FILES: [&str; 3] = [
    "/static/demo/receptor.pdbqt",
    "/static/demo/ligand.sdf",
    "/static/demo/pose.pdbqt",
];

pub const MESSAGE_ENDPOINT: &str = "/chat/message/";

fn render(state: &SharedState, name: &str, ctx: Value) -> Result<Html<String>, StatusCode> {
    let template = state.templates.get_template(name).map_err(|e| {
        error!("Template {} unavailable: {}", name, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    template.render(ctx).map(Html).map_err(|e| {
        error!("Rendering {} failed: {}", name, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub async fn home(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), StatusCode> {
    let page = render(&state, "home.html", context! { messages => state.landing_messages, demo_files => DEMO_FILES })?;
    Ok((ensure_cookies(jar), page))
}

/// Tells the visitor how to reach this server from the chat client.
pub async fn chat_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), StatusCode> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("127.0.0.1:8000");
    let page = render(
        &state,
        "chat.html",
        context! { server_url => format!("http://{}", host), message_endpoint => MESSAGE_ENDPOINT },
    )?;
    Ok((ensure_cookies(jar), page))
}
