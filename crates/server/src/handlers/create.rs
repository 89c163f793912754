//! `POST /documents`.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use doctree_core::{Document, DocumentDraft};

use crate::error::{ApiError, CREATE_FAILED};
use crate::state::AppState;

/// Validate the draft, then create it. Links the new document under its
/// parent when that parent exists.
pub async fn create_document(
    State(state): State<AppState>, payload: Result<Json<DocumentDraft>, JsonRejection>,
) -> Result<Json<Document>, ApiError> {
    let Json(draft) = payload?;
    draft.validate(None).map_err(ApiError::failed(CREATE_FAILED))?;

    let document = state.store.create(&draft).await.map_err(ApiError::failed(CREATE_FAILED))?;
    tracing::info!(document_id = document.id, parent_id = document.parent_id, "created document");

    Ok(Json(document))
}
