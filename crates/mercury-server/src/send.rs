use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::error;

use mercury_types::api::{MessageEntry, SendMessageRequest};

use crate::AppState;

/// `POST /send`, the one operation this service exposes. Persists the
/// message and answers with the ranked window of the 10 newest messages.
/// Malformed bodies never reach here; axum's `Json` extractor rejects them
/// with a client error before any database work starts.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let created_at = chrono::Utc::now().to_rfc3339();

    // Run the blocking transaction off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.record_send(&req.name, &req.text, &created_at)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("send transaction failed: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let entries = rows
        .into_iter()
        .map(|row| {
            // Timestamps are server-written RFC 3339; a row that no longer
            // parses is corrupt data, and inventing a value for the client
            // would hide it. Fail the request like any other store error.
            let created_at = row.created_at.parse().map_err(|e| {
                error!("Corrupt created_at '{}': {}", row.created_at, e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

            Ok(MessageEntry {
                name: row.name,
                text: row.text,
                created_at,
                order_number: row.order_number,
                message_count: row.message_count,
            })
        })
        .collect::<Result<Vec<MessageEntry>, StatusCode>>()?;

    Ok(Json(entries))
}
