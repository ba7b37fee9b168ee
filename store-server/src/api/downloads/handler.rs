//! Download API Handler
//!
//! The token is the capability: each request atomically spends one download
//! before any file byte leaves the server.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::core::ServerState;
use crate::fulfillment::downloads;
use crate::utils::{AppError, AppResult};

pub async fn download(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    let grant = downloads::consume(&state.pool, &token).await?;

    let path = state.config.files_dir().join(&grant.source_file);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        AppError::Internal(format!(
            "Source file {} unreadable: {e}",
            grant.source_file
        ))
    })?;

    let mime = mime_guess::from_path(&grant.source_file).first_or_octet_stream();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download.bin".to_string());

    tracing::info!(
        token = %token,
        remaining = grant.downloads_remaining,
        "Download served"
    );

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
