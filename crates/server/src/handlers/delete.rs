//! `DELETE /documents/{id}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use super::parse_id;
use crate::error::{ApiError, DELETE_FAILED};
use crate::state::AppState;

/// Remove one document. Children and the parent's `childrenIds` are left as
/// they are.
pub async fn delete_document(State(state): State<AppState>, Path(raw_id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    state.store.delete(id).await.map_err(ApiError::failed(DELETE_FAILED))?;
    tracing::info!(document_id = id, "deleted document");

    Ok(StatusCode::NO_CONTENT)
}
