//! Input validation for document writes.
//!
//! Runs at the request boundary before any store call.

use crate::Error;
use crate::document::{DocumentDraft, ROOT_PARENT};

pub const INVALID_TITLE: &str = "Invalid title";
pub const SELF_PARENT: &str = "A document cannot be a parent of itself";

impl DocumentDraft {
    /// Validate a draft before create (`id == None`) or update.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if:
    /// - `title` is empty
    /// - `parent_id` equals the document's own `id`
    ///
    /// A `parent_id` that names no document, negative ones included, is
    /// valid; the store leaves such a document unlinked.
    pub fn validate(&self, id: Option<i64>) -> Result<(), Error> {
        if self.title.is_empty() {
            return Err(Error::Validation(INVALID_TITLE.into()));
        }

        if let Some(id) = id
            && self.parent_id != ROOT_PARENT
            && self.parent_id == id
        {
            return Err(Error::Validation(SELF_PARENT.into()));
        }

        Ok(())
    }
}
