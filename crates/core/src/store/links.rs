//! Parent-child link maintenance.

use super::connection::DocumentStore;
use crate::Error;
use crate::document::{Document, ROOT_PARENT};
use crate::error::{Operation, ResultExt};
use tokio_rusqlite::params;

/// Direction of a `children_ids` change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildLink {
    Add,
    Remove,
}

impl ChildLink {
    /// Apply the change to a children sequence in place.
    ///
    /// `Add` keeps set semantics: an id already present is not appended
    /// twice. Returns whether the sequence changed.
    pub fn apply(self, children: &mut Vec<i64>, child_id: i64) -> bool {
        match self {
            ChildLink::Add => {
                if children.contains(&child_id) {
                    return false;
                }
                children.push(child_id);
                true
            }
            ChildLink::Remove => {
                let before = children.len();
                children.retain(|&id| id != child_id);
                children.len() != before
            }
        }
    }
}

impl DocumentStore {
    /// Add or remove `child_id` in `parent.children_ids` and persist it.
    ///
    /// `parent` is the caller's snapshot; the whole sequence is written back
    /// without checking whether the stored row changed since it was read.
    pub async fn toggle_children_ids(&self, parent: &mut Document, child_id: i64, link: ChildLink) -> Result<(), Error> {
        if !link.apply(&mut parent.children_ids, child_id) {
            return Ok(());
        }

        let parent_id = parent.id;
        let encoded = serde_json::to_string(&parent.children_ids)
            .map_err(|e| Error::CorruptRecord { id: parent_id, reason: e.to_string() })?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("UPDATE documents SET children_ids = ?1 WHERE id = ?2", params![encoded, parent_id])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
            .during(Operation::LinkChild)?;

        tracing::debug!(parent_id, child_id, ?link, "children_ids updated");
        Ok(())
    }

    /// Load the document referenced by `parent_id`.
    ///
    /// Root (`0`) and ids with no record resolve to `None`; a missing parent
    /// is not an error. Any other failure propagates.
    pub(crate) async fn find_parent(&self, parent_id: i64) -> Result<Option<Document>, Error> {
        if parent_id == ROOT_PARENT {
            return Ok(None);
        }

        match self.get(parent_id).await {
            Ok(parent) => Ok(Some(parent)),
            Err(err) if err.is_not_found() => {
                tracing::debug!(parent_id, "referenced parent does not exist, leaving unlinked");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
