//! Document model.

use serde::{Deserialize, Serialize};

/// `parent_id` value meaning "no parent".
pub const ROOT_PARENT: i64 = 0;

/// A node in the document hierarchy.
///
/// `children_ids` is denormalized: it mirrors the `parent_id` of other
/// documents and is maintained only by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub parent_id: i64,
    #[serde(default)]
    pub children_ids: Vec<i64>,
}

impl Document {
    pub fn has_parent(&self) -> bool {
        self.parent_id != ROOT_PARENT
    }
}

/// The client-writable fields of a document.
///
/// Request bodies may carry `id` or `childrenIds`; both are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub parent_id: i64,
}

impl DocumentDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Default::default() }
    }

    pub fn with_sort(mut self, sort: i64) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Offset/limit window over the sorted document list, optionally
/// restricted to a set of ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: i64,
    pub offset: i64,
    pub ids: Vec<i64>,
}

impl ListQuery {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset, ids: Vec::new() }
    }

    pub fn with_ids(mut self, ids: Vec<i64>) -> Self {
        self.ids = ids;
        self
    }
}
