//! Shared handler state.

use std::sync::Arc;

use doctree_core::{DocumentCache, DocumentStore};

const DEFAULT_LIST_CONCURRENCY: usize = 8;

/// Components injected into every handler.
///
/// Cloned per request; the store handle and cache are shared.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: DocumentStore,
    pub cache: Arc<DocumentCache>,
    /// Upper bound on list items processed at once.
    pub list_max_concurrency: usize,
    /// Appended to every title in list responses.
    pub list_title_suffix: Arc<str>,
}

impl AppState {
    pub fn new(store: DocumentStore, cache: Arc<DocumentCache>) -> Self {
        Self { store, cache, list_max_concurrency: DEFAULT_LIST_CONCURRENCY, list_title_suffix: Arc::from("") }
    }

    pub fn with_list_processing(mut self, max_concurrency: usize, title_suffix: &str) -> Self {
        self.list_max_concurrency = max_concurrency.max(1);
        self.list_title_suffix = Arc::from(title_suffix);
        self
    }
}
