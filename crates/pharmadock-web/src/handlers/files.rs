//! Docking structure and log downloads.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use pharmadock_common::paths::{extension_of, resolve_under};
use pharmadock_common::FileReference;
use tracing::{debug, warn};

use crate::state::SharedState;

pub const SDF_CONTENT_TYPE: &str = "chemical/x-mdl-sdfile";
pub const PDB_CONTENT_TYPE: &str = "chemical/x-pdb";

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, message).into_response()
}

async fn read_under_root(state: &SharedState, path: &str) -> Option<Vec<u8>> {
    if !std::path::Path::new(path).starts_with(&state.docking_dir) {
        warn!(path, "Rejected file request outside the docking results");
        return None;
    }
    let full = match resolve_under(&state.file_root, path) {
        Ok(full) => full,
        Err(e) => {
            warn!("Rejected file request: {}", e);
            return None;
        }
    };
    match tokio::fs::read(&full).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            debug!("Cannot read {:?}: {}", full, e);
            None
        }
    }
}

/// `GET /chat/get-docking-file/{*path}`
pub async fn docking_file(State(state): State<SharedState>, Path(path): Path<String>) -> Response {
    let Some(bytes) = read_under_root(&state, &path).await else {
        return not_found(format!("File not found: {}", path));
    };
    let content_type = if extension_of(&path) == ".sdf" { SDF_CONTENT_TYPE } else { PDB_CONTENT_TYPE };
    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

/// `GET /chat/get-docking-log/{*path}`: served as an attachment.
pub async fn docking_log(State(state): State<SharedState>, Path(path): Path<String>) -> Response {
    let Some(bytes) = read_under_root(&state, &path).await else {
        return not_found("Log file not found".to_string());
    };
    let file_name = FileReference::new(path.as_str()).file_name().to_string();
    (
        [
            (header::CONTENT_TYPE, "text/plain".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        bytes,
    )
        .into_response()
}
