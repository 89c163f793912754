//! Document CRUD operations.

use super::connection::DocumentStore;
use super::links::ChildLink;
use crate::Error;
use crate::document::{Document, DocumentDraft, ListQuery, ROOT_PARENT};
use crate::error::{Operation, ResultExt};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const SELECT_DOCUMENT: &str = "SELECT id, title, sort, parent_id, children_ids FROM documents";

/// A row as stored, before `children_ids` is decoded.
struct StoredRow {
    id: i64,
    title: String,
    sort: i64,
    parent_id: i64,
    children_json: String,
}

impl StoredRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            sort: row.get(2)?,
            parent_id: row.get(3)?,
            children_json: row.get(4)?,
        })
    }

    fn decode(self) -> Result<Document, Error> {
        let children_ids = serde_json::from_str(&self.children_json)
            .map_err(|e| Error::CorruptRecord { id: self.id, reason: format!("children_ids: {e}") })?;

        Ok(Document { id: self.id, title: self.title, sort: self.sort, parent_id: self.parent_id, children_ids })
    }
}

fn fetch_document(conn: &rusqlite::Connection, id: i64) -> Result<Document, Error> {
    let mut stmt = conn.prepare(&format!("{SELECT_DOCUMENT} WHERE id = ?1"))?;

    match stmt.query_row(params![id], StoredRow::read) {
        Ok(row) => row.decode(),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::NotFound(id)),
        Err(e) => Err(e.into()),
    }
}

fn log_partial_failure(op: Operation, document_id: i64, parent_id: i64, err: &Error) {
    tracing::warn!(
        op = %op,
        document_id,
        parent_id,
        error = %err,
        "parent link update failed; earlier writes of this operation remain applied"
    );
}

impl DocumentStore {
    /// Insert a document and link it into its parent's `children_ids`.
    ///
    /// The record is written first, then the parent is loaded and updated.
    /// A `parent_id` that references no document leaves the new document
    /// unlinked without error.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an invalid draft (nothing is written),
    /// or the store error of whichever step failed. A failure after the
    /// insert does not remove the inserted record.
    pub async fn create(&self, draft: &DocumentDraft) -> Result<Document, Error> {
        draft.validate(None)?;

        let insert = draft.clone();
        let document = self
            .conn
            .call(move |conn| -> Result<Document, Error> {
                conn.execute(
                    "INSERT INTO documents (title, sort, parent_id, children_ids) VALUES (?1, ?2, ?3, '[]')",
                    params![insert.title, insert.sort, insert.parent_id],
                )?;
                let id = conn.last_insert_rowid();

                // The parent did not exist and the serial landed on its id.
                let mut parent_id = insert.parent_id;
                if parent_id == id {
                    conn.execute("UPDATE documents SET parent_id = ?1 WHERE id = ?2", params![ROOT_PARENT, id])?;
                    parent_id = ROOT_PARENT;
                }

                Ok(Document { id, title: insert.title, sort: insert.sort, parent_id, children_ids: Vec::new() })
            })
            .await
            .map_err(Error::from)
            .during(Operation::Create)?;

        let parent = match self.find_parent(document.parent_id).await {
            Ok(parent) => parent,
            Err(err) => {
                log_partial_failure(Operation::Create, document.id, document.parent_id, &err);
                return Err(err.during(Operation::Create));
            }
        };

        if let Some(mut parent) = parent
            && let Err(err) = self.toggle_children_ids(&mut parent, document.id, ChildLink::Add).await
        {
            log_partial_failure(Operation::Create, document.id, parent.id, &err);
            return Err(err.during(Operation::Create));
        }

        tracing::debug!(document_id = document.id, parent_id = document.parent_id, "document created");
        Ok(document)
    }

    /// Get a document by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record has this id.
    pub async fn get(&self, id: i64) -> Result<Document, Error> {
        self.conn
            .call(move |conn| fetch_document(conn, id))
            .await
            .map_err(Error::from)
            .during(Operation::Get)
    }

    /// List documents ordered by `sort` (then `id`).
    ///
    /// A non-empty `ids` filter applies before `offset` and `limit`.
    /// `limit` has no upper bound here.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Document>, Error> {
        let query = query.clone();
        self.conn
            .call(move |conn| -> Result<Vec<Document>, Error> {
                let mut sql = String::from(SELECT_DOCUMENT);
                let mut bind: Vec<i64> = Vec::with_capacity(query.ids.len() + 2);

                if !query.ids.is_empty() {
                    let placeholders = vec!["?"; query.ids.len()].join(", ");
                    sql.push_str(&format!(" WHERE id IN ({placeholders})"));
                    bind.extend(&query.ids);
                }

                sql.push_str(" ORDER BY sort ASC, id ASC LIMIT ? OFFSET ?");
                bind.push(query.limit);
                bind.push(query.offset);

                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params_from_iter(bind.iter()), StoredRow::read)?;

                let mut documents = Vec::new();
                for row in rows {
                    documents.push(row?.decode()?);
                }
                Ok(documents)
            })
            .await
            .map_err(Error::from)
            .during(Operation::List)
    }

    /// Update `title`, `sort` and `parent_id` of an existing document.
    ///
    /// When `parent_id` changes, the id is removed from the old parent's
    /// `children_ids` (if that parent exists) and added to the new parent's
    /// (if that parent exists) before the record itself is written.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if `id` does not exist, `Error::Validation`
    /// for an invalid draft, or the store error of the failing step.
    pub async fn update(&self, id: i64, draft: &DocumentDraft) -> Result<Document, Error> {
        draft.validate(Some(id))?;

        let existing = self.get(id).await.during(Operation::Update)?;

        if existing.parent_id != draft.parent_id {
            let old_parent = self.find_parent(existing.parent_id).await.during(Operation::Update)?;
            let new_parent = self.find_parent(draft.parent_id).await.during(Operation::Update)?;

            if let Some(mut old_parent) = old_parent
                && let Err(err) = self.toggle_children_ids(&mut old_parent, id, ChildLink::Remove).await
            {
                log_partial_failure(Operation::Update, id, old_parent.id, &err);
                return Err(err.during(Operation::Update));
            }

            if let Some(mut new_parent) = new_parent
                && let Err(err) = self.toggle_children_ids(&mut new_parent, id, ChildLink::Add).await
            {
                log_partial_failure(Operation::Update, id, new_parent.id, &err);
                return Err(err.during(Operation::Update));
            }
        }

        let draft = draft.clone();
        let updated = self
            .conn
            .call(move |conn| -> Result<Document, Error> {
                let changed = conn.execute(
                    "UPDATE documents SET title = ?1, sort = ?2, parent_id = ?3 WHERE id = ?4",
                    params![draft.title, draft.sort, draft.parent_id, id],
                )?;
                if changed == 0 {
                    return Err(Error::NotFound(id));
                }
                fetch_document(conn, id)
            })
            .await
            .map_err(Error::from)
            .during(Operation::Update)?;

        tracing::debug!(document_id = id, parent_id = updated.parent_id, "document updated");
        Ok(updated)
    }

    /// Delete a document record.
    ///
    /// Parents keep the id in their `children_ids` and children keep their
    /// `parent_id`. Deleting a missing id succeeds.
    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        let removed = self
            .conn
            .call(move |conn| conn.execute("DELETE FROM documents WHERE id = ?1", params![id]))
            .await
            .map_err(Error::from)
            .during(Operation::Delete)?;

        tracing::debug!(document_id = id, removed, "document deleted");
        Ok(())
    }

    /// Number of stored documents.
    pub async fn count(&self) -> Result<u64, Error> {
        let count = self
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get::<_, i64>(0)))
            .await
            .map_err(Error::from)
            .during(Operation::Count)?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    async fn store() -> DocumentStore {
        DocumentStore::open_in_memory().await.unwrap()
    }

    async fn all(store: &DocumentStore) -> Vec<Document> {
        store.list(&ListQuery::new(1_000, 0)).await.unwrap()
    }

    async fn corrupt_children(store: &DocumentStore, id: i64) {
        store
            .conn
            .call(move |conn| conn.execute("UPDATE documents SET children_ids = 'nope' WHERE id = ?1", params![id]))
            .await
            .unwrap();
    }

    /// Make every later write to `children_ids` of `id` fail.
    async fn lock_children(store: &DocumentStore, id: i64) {
        store
            .conn
            .call(move |conn| {
                conn.execute_batch(&format!(
                    "CREATE TRIGGER lock_children_{id} BEFORE UPDATE OF children_ids ON documents
                     WHEN OLD.id = {id}
                     BEGIN SELECT RAISE(ABORT, 'children_ids locked'); END;"
                ))
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = store().await;
        let created = store.create(&DocumentDraft::new("Root").with_sort(3)).await.unwrap();

        assert!(created.id > 0);
        assert_eq!(created.title, "Root");
        assert_eq!(created.sort, 3);
        assert_eq!(created.parent_id, ROOT_PARENT);
        assert!(created.children_ids.is_empty());

        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_twice_is_identical() {
        let store = store().await;
        let created = store.create(&DocumentDraft::new("Stable")).await.unwrap();
        assert_eq!(store.get(created.id).await.unwrap(), store.get(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = store().await;
        let err = store.get(12345).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_root_create_does_not_touch_others() {
        let store = store().await;
        let parent = store.create(&DocumentDraft::new("Parent")).await.unwrap();
        let child = store.create(&DocumentDraft::new("Child").with_parent(parent.id)).await.unwrap();
        let before = all(&store).await;

        store.create(&DocumentDraft::new("Another root")).await.unwrap();

        let after = all(&store).await;
        for doc in &before {
            let same = after.iter().find(|d| d.id == doc.id).unwrap();
            assert_eq!(same.children_ids, doc.children_ids);
        }
        assert_eq!(store.get(parent.id).await.unwrap().children_ids, vec![child.id]);
    }

    #[tokio::test]
    async fn test_create_links_parent_exactly_once() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_parent(a.id)).await.unwrap();

        assert_eq!(b.parent_id, a.id);
        let a = store.get(a.id).await.unwrap();
        assert_eq!(a.children_ids.iter().filter(|&&id| id == b.id).count(), 1);
    }

    #[tokio::test]
    async fn test_create_with_missing_parent_is_unlinked() {
        let store = store().await;
        store.create(&DocumentDraft::new("First")).await.unwrap();

        let orphan = store.create(&DocumentDraft::new("Orphan").with_parent(900)).await.unwrap();
        assert_eq!(orphan.parent_id, 900);
        for doc in all(&store).await {
            assert!(!doc.children_ids.contains(&orphan.id));
        }
    }

    #[tokio::test]
    async fn test_create_with_negative_parent_is_unlinked() {
        let store = store().await;
        let other = store.create(&DocumentDraft::new("Other")).await.unwrap();

        let doc = store.create(&DocumentDraft::new("Neg").with_parent(-1)).await.unwrap();
        assert_eq!(doc.parent_id, -1);
        assert_eq!(store.get(doc.id).await.unwrap().parent_id, -1);
        assert!(store.get(other.id).await.unwrap().children_ids.is_empty());
    }

    #[tokio::test]
    async fn test_update_to_negative_parent_unlinks() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_parent(a.id)).await.unwrap();

        let moved = store.update(b.id, &DocumentDraft::new("B").with_parent(-5)).await.unwrap();
        assert_eq!(moved.parent_id, -5);
        assert!(store.get(a.id).await.unwrap().children_ids.is_empty());
    }

    #[tokio::test]
    async fn test_create_never_self_parents() {
        let store = store().await;
        // Empty store: the first serial is 1, the same id as the missing parent.
        let doc = store.create(&DocumentDraft::new("Lonely").with_parent(1)).await.unwrap();
        assert_eq!(doc.id, 1);
        assert_eq!(doc.parent_id, ROOT_PARENT);
        assert!(store.get(1).await.unwrap().children_ids.is_empty());
    }

    #[tokio::test]
    async fn test_create_empty_title_writes_nothing() {
        let store = store().await;
        let err = store.create(&DocumentDraft::new("")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_reparents() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let c = store.create(&DocumentDraft::new("C")).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_parent(a.id)).await.unwrap();

        let moved = store
            .update(b.id, &DocumentDraft::new("B moved").with_parent(c.id).with_sort(5))
            .await
            .unwrap();

        assert_eq!(moved.parent_id, c.id);
        assert_eq!(moved.title, "B moved");
        assert_eq!(moved.sort, 5);
        assert!(!store.get(a.id).await.unwrap().children_ids.contains(&b.id));
        assert_eq!(store.get(c.id).await.unwrap().children_ids, vec![b.id]);
    }

    #[tokio::test]
    async fn test_update_to_root_unlinks() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_parent(a.id)).await.unwrap();

        let moved = store.update(b.id, &DocumentDraft::new("B")).await.unwrap();
        assert_eq!(moved.parent_id, ROOT_PARENT);
        assert!(store.get(a.id).await.unwrap().children_ids.is_empty());
    }

    #[tokio::test]
    async fn test_update_same_parent_keeps_links() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_parent(a.id)).await.unwrap();

        store.update(b.id, &DocumentDraft::new("B renamed").with_parent(a.id)).await.unwrap();
        assert_eq!(store.get(a.id).await.unwrap().children_ids, vec![b.id]);
    }

    #[tokio::test]
    async fn test_update_preserves_own_children() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_parent(a.id)).await.unwrap();

        let a = store.update(a.id, &DocumentDraft::new("A renamed").with_sort(9)).await.unwrap();
        assert_eq!(a.children_ids, vec![b.id]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = store().await;
        let err = store.update(77, &DocumentDraft::new("Ghost")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_self_parent_is_rejected() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let err = store.update(a.id, &DocumentDraft::new("A").with_parent(a.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.get(a.id).await.unwrap().children_ids.is_empty());
    }

    #[tokio::test]
    async fn test_delete_does_not_cascade() {
        let store = store().await;
        let p = store.create(&DocumentDraft::new("Root")).await.unwrap();
        let k = store.create(&DocumentDraft::new("Kid").with_parent(p.id)).await.unwrap();
        assert_eq!(store.get(p.id).await.unwrap().children_ids, vec![k.id]);

        store.delete(k.id).await.unwrap();

        assert_eq!(store.get(p.id).await.unwrap().children_ids, vec![k.id]);
        assert!(store.get(k.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_parent_leaves_dangling_child() {
        let store = store().await;
        let p = store.create(&DocumentDraft::new("Root")).await.unwrap();
        let k = store.create(&DocumentDraft::new("Kid").with_parent(p.id)).await.unwrap();

        store.delete(p.id).await.unwrap();
        assert_eq!(store.get(k.id).await.unwrap().parent_id, p.id);
    }

    #[tokio::test]
    async fn test_delete_missing_succeeds() {
        let store = store().await;
        assert!(store.delete(999).await.is_ok());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = store().await;
        let first = store.create(&DocumentDraft::new("First")).await.unwrap();
        store.delete(first.id).await.unwrap();

        let second = store.create(&DocumentDraft::new("Second")).await.unwrap();
        assert!(second.id > first.id);
        assert!(store.get(first.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let store = store().await;
        let docs = store.list(&ListQuery::new(10, 0).with_ids(vec![])).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_list_sorted_and_paged() {
        let store = store().await;
        let c = store.create(&DocumentDraft::new("C").with_sort(3)).await.unwrap();
        let a = store.create(&DocumentDraft::new("A").with_sort(1)).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_sort(2)).await.unwrap();
        let a2 = store.create(&DocumentDraft::new("A2").with_sort(1)).await.unwrap();

        let ids: Vec<i64> = store.list(&ListQuery::new(10, 0)).await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a.id, a2.id, b.id, c.id]);

        let page: Vec<i64> = store.list(&ListQuery::new(2, 1)).await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(page, vec![a2.id, b.id]);
    }

    #[tokio::test]
    async fn test_list_filters_by_ids_before_paging() {
        let store = store().await;
        let mut created = Vec::new();
        for sort in 0..5 {
            created.push(store.create(&DocumentDraft::new(format!("Doc {sort}")).with_sort(sort)).await.unwrap());
        }

        let wanted = vec![created[4].id, created[1].id, created[3].id, 9_999];
        let docs = store.list(&ListQuery::new(2, 1).with_ids(wanted)).await.unwrap();
        let ids: Vec<i64> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![created[3].id, created[4].id]);
    }

    #[tokio::test]
    async fn test_corrupt_children_is_storage_error() {
        let store = store().await;
        let doc = store.create(&DocumentDraft::new("Broken")).await.unwrap();
        corrupt_children(&store, doc.id).await;

        let err = store.get(doc.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_create_keeps_record_when_parent_read_fails() {
        let store = store().await;
        let parent = store.create(&DocumentDraft::new("Parent")).await.unwrap();
        corrupt_children(&store, parent.id).await;

        let err = store.create(&DocumentDraft::new("Child").with_parent(parent.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        // No rollback: the inserted child is still there.
        assert_eq!(store.count().await.unwrap(), 2);
        let child_id = parent.id + 1;
        assert_eq!(store.get(child_id).await.unwrap().parent_id, parent.id);
    }

    #[tokio::test]
    async fn test_create_keeps_record_when_link_write_fails() {
        let store = store().await;
        let parent = store.create(&DocumentDraft::new("Parent")).await.unwrap();
        lock_children(&store, parent.id).await;

        let err = store.create(&DocumentDraft::new("Child").with_parent(parent.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.operation(), Some(Operation::LinkChild));

        assert_eq!(store.count().await.unwrap(), 2);
        assert!(store.get(parent.id).await.unwrap().children_ids.is_empty());
    }

    #[tokio::test]
    async fn test_update_fails_when_old_parent_unlink_fails() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let c = store.create(&DocumentDraft::new("C")).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_parent(a.id)).await.unwrap();
        lock_children(&store, a.id).await;

        let err = store.update(b.id, &DocumentDraft::new("B moved").with_parent(c.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        assert_eq!(store.get(a.id).await.unwrap().children_ids, vec![b.id]);
        assert!(store.get(c.id).await.unwrap().children_ids.is_empty());
        let b = store.get(b.id).await.unwrap();
        assert_eq!((b.title.as_str(), b.parent_id), ("B", a.id));
    }

    #[tokio::test]
    async fn test_update_leaves_old_parent_unlinked_when_new_link_fails() {
        let store = store().await;
        let a = store.create(&DocumentDraft::new("A")).await.unwrap();
        let c = store.create(&DocumentDraft::new("C")).await.unwrap();
        let b = store.create(&DocumentDraft::new("B").with_parent(a.id)).await.unwrap();
        lock_children(&store, c.id).await;

        let err = store.update(b.id, &DocumentDraft::new("B moved").with_parent(c.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        // The removal from A already happened; B's own record was not written.
        assert!(store.get(a.id).await.unwrap().children_ids.is_empty());
        assert!(store.get(c.id).await.unwrap().children_ids.is_empty());
        assert_eq!(store.get(b.id).await.unwrap().parent_id, a.id);
    }

    #[tokio::test]
    async fn test_count_failure_is_tagged() {
        let store = store().await;
        store.conn.call(|conn| conn.execute_batch("DROP TABLE documents")).await.unwrap();

        let err = store.count().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.operation(), Some(Operation::Count));
    }
}
