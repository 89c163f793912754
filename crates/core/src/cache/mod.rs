//! In-memory read-through cache for single documents.
//!
//! Handlers consult the cache before the store on single-document reads and
//! populate it after a store read. Entries expire after a fixed live time:
//!
//! - lazily, when an expired entry is read
//! - in bulk, by a background sweeper task owned by the server

pub mod ttl;

pub use ttl::DocumentCache;
