//! `PUT /documents/{id}`.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use doctree_core::{Document, DocumentDraft};

use super::parse_id;
use crate::error::{ApiError, UPDATE_FAILED};
use crate::state::AppState;

/// Replace title, sort and parent of an existing document.
///
/// The cache is not touched; a cached copy stays until it expires.
pub async fn update_document(
    State(state): State<AppState>, Path(raw_id): Path<String>, payload: Result<Json<DocumentDraft>, JsonRejection>,
) -> Result<Json<Document>, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(draft) = payload?;
    draft.validate(Some(id)).map_err(ApiError::failed(UPDATE_FAILED))?;

    let document = state.store.update(id, &draft).await.map_err(ApiError::failed(UPDATE_FAILED))?;
    tracing::info!(document_id = id, parent_id = document.parent_id, "updated document");

    Ok(Json(document))
}
