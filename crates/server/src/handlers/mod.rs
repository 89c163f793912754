//! HTTP handlers for the document routes.
//!
//! Each handler parses its path and body, calls the store or cache and
//! shapes the JSON response. Failures become [`ApiError`] values.

pub mod create;
pub mod delete;
pub mod get;
pub mod health;
pub mod list;
pub mod update;

pub use create::create_document;
pub use delete::delete_document;
pub use get::get_document;
pub use health::health;
pub use list::list_documents;
pub use update::update_document;

use crate::error::ApiError;

/// Parse a `{id}` path segment.
pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse().map_err(|_| ApiError::InvalidId)
}
