//! Core types and shared functionality for doctree.
//!
//! This crate provides:
//! - Document model and input validation
//! - SQLite-backed document store with parent/child link maintenance
//! - In-memory TTL cache for single-document reads
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod store;
pub mod validation;

pub use cache::DocumentCache;
pub use config::{AppConfig, ConfigError};
pub use document::{Document, DocumentDraft, ListQuery, ROOT_PARENT};
pub use error::{Error, ErrorKind, Operation};
pub use store::{ChildLink, DocumentStore};
