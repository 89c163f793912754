//! Unified error types for doctree.
//!
//! Every variant belongs to one of three kinds: validation, not-found or
//! storage. Repository operations wrap failures with an [`Operation`] tag.

use std::fmt;

use tokio_rusqlite::rusqlite;

/// Unified error types for the document store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected input (empty title, self-parenting).
    #[error("VALIDATION_ERROR: {0}")]
    Validation(String),

    /// No record with the requested id.
    #[error("NOT_FOUND: document {0} does not exist")]
    NotFound(i64),

    /// Database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be decoded.
    #[error("STORAGE_ERROR: corrupt record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },

    /// A failure tagged with the repository operation that produced it.
    #[error("{op}: {source}")]
    Operation {
        op: Operation,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
}

/// Repository operations used as error tags and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Ping,
    Seed,
    Create,
    Get,
    List,
    Update,
    Delete,
    Count,
    LinkChild,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "store.open",
            Operation::Ping => "store.ping",
            Operation::Seed => "store.seed",
            Operation::Create => "store.create_document",
            Operation::Get => "store.get_document",
            Operation::List => "store.list_documents",
            Operation::Update => "store.update_document",
            Operation::Delete => "store.delete_document",
            Operation::Count => "store.count_documents",
            Operation::LinkChild => "store.toggle_children_ids",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify the error, looking through operation tags.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptRecord { .. } => ErrorKind::Storage,
            Error::Operation { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The error underneath any operation tags.
    pub fn root(&self) -> &Error {
        match self {
            Error::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// The operation tag, if any.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::Operation { op, .. } => Some(*op),
            _ => None,
        }
    }

    /// Tag the error with an operation. Already-tagged errors keep their
    /// innermost tag so the log line names the step that actually failed.
    pub fn during(self, op: Operation) -> Self {
        match self {
            tagged @ Error::Operation { .. } => tagged,
            other => Error::Operation { op, source: Box::new(other) },
        }
    }
}

/// Attach an [`Operation`] tag to a result's error.
pub trait ResultExt<T> {
    fn during(self, op: Operation) -> Result<T, Error>;
}

impl<T> ResultExt<T> for Result<T, Error> {
    fn during(self, op: Operation) -> Result<T, Error> {
        self.map_err(|e| e.during(op))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
