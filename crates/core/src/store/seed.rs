//! First-start population of an empty store.

use super::connection::DocumentStore;
use crate::Error;
use crate::document::DocumentDraft;
use crate::error::{Operation, ResultExt};

impl DocumentStore {
    /// Create `count` root documents titled `Document 1..=count` if the store
    /// holds no documents yet.
    ///
    /// Returns the number of documents created (0 when the store was not
    /// empty or `count` is 0).
    pub async fn seed_if_empty(&self, count: usize) -> Result<usize, Error> {
        if count == 0 || self.count().await.during(Operation::Seed)? > 0 {
            return Ok(0);
        }

        for n in 1..=count {
            self.create(&DocumentDraft::new(format!("Document {n}")))
                .await
                .during(Operation::Seed)?;
        }

        tracing::info!(count, "seeded empty document store");
        Ok(count)
    }
}
