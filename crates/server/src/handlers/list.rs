//! `GET /documents?page=&limit=&ids=`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use doctree_core::{Document, ListQuery};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::error::{ApiError, LIST_FAILED};
use crate::state::AppState;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

/// Raw query string. Numbers are parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    ids: Option<String>,
}

impl ListParams {
    /// Build the store query. Missing, non-numeric or non-positive `page`
    /// and `limit` fall back to their defaults.
    fn to_query(&self) -> Result<ListQuery, ApiError> {
        let page = positive_or(self.page.as_deref(), DEFAULT_PAGE);
        let limit = positive_or(self.limit.as_deref(), DEFAULT_LIMIT);
        let offset = (page - 1).saturating_mul(limit);

        Ok(ListQuery::new(limit, offset).with_ids(parse_ids(self.ids.as_deref())?))
    }
}

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

/// `ids` is a JSON array of integers. Absent, empty or `null` means no filter.
fn parse_ids(raw: Option<&str>) -> Result<Vec<i64>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str::<Option<Vec<i64>>>(json)
            .map(Option::unwrap_or_default)
            .map_err(|_| ApiError::InvalidIds),
    }
}

pub async fn list_documents(
    State(state): State<AppState>, Query(params): Query<ListParams>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let query = params.to_query()?;
    let documents = state.store.list(&query).await.map_err(ApiError::failed(LIST_FAILED))?;

    let documents =
        process_items(documents, Arc::clone(&state.list_title_suffix), state.list_max_concurrency).await?;
    tracing::debug!(count = documents.len(), limit = query.limit, offset = query.offset, "listed documents");

    Ok(Json(documents))
}

/// Run one task per document, at most `max_concurrency` at a time, and wait
/// for all of them. Output order matches input order.
async fn process_items(
    documents: Vec<Document>, title_suffix: Arc<str>, max_concurrency: usize,
) -> Result<Vec<Document>, JoinError> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let total = documents.len();

    for (index, mut document) in documents.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let title_suffix = Arc::clone(&title_suffix);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            document.title.push_str(&title_suffix);
            (index, document)
        });
    }

    let mut slots: Vec<Option<Document>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        let (index, document) = joined?;
        slots[index] = Some(document);
    }

    Ok(slots.into_iter().flatten().collect())
}
