//! `GET /documents/{id}`: cache first, then the store.

use axum::{
    Json,
    extract::{Path, State},
};
use doctree_core::Document;

use super::parse_id;
use crate::error::{ApiError, GET_FAILED};
use crate::state::AppState;

pub async fn get_document(State(state): State<AppState>, Path(raw_id): Path<String>) -> Result<Json<Document>, ApiError> {
    let id = parse_id(&raw_id)?;

    if let Some(document) = state.cache.get(id) {
        tracing::debug!(document_id = id, "cache hit");
        return Ok(Json(document));
    }

    let document = state.store.get(id).await.map_err(ApiError::failed(GET_FAILED))?;
    state.cache.set(document.clone());

    Ok(Json(document))
}
