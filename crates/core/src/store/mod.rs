//! SQLite-backed document repository.
//!
//! This module owns every read and write against the backing store and
//! keeps the denormalized parent/children links consistent:
//!
//! - `documents`: create, get, list, update, delete
//! - `links`: add/remove a child id in a parent's `children_ids`
//! - `seed`: first-start population of an empty store
//!
//! Multi-step writes are independent statements. A failure between steps is
//! surfaced without rollback and leaves the earlier steps applied. Parent
//! link updates are read-modify-write without compare-and-swap, so two
//! concurrent toggles on the same parent can lose one of the updates.

pub mod connection;
pub mod documents;
pub mod links;
pub mod migrations;
pub mod seed;

pub use connection::DocumentStore;
pub use links::ChildLink;
