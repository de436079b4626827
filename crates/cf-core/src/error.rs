//! Unified error type for clipforge.
//!
//! Every library crate reports failures through [`Error`]. The variants follow
//! the fault split callers care about: client faults (bad input, missing or
//! lapsed entities) versus server faults (external tools, persistence).
//! [`Error::http_status`] gives a suggested wire status for a service layer.

use std::fmt;

/// Unified error type covering all failure modes in clipforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller-supplied input violates a stated constraint.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "asset", "share link").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The entity existed but its lifetime has lapsed.
    #[error("{entity} expired: {id}")]
    Expired {
        /// The kind of entity.
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Probed media falls outside configured acceptance bounds.
    #[error("Policy violation: {0}")]
    Policy(String),

    /// A file could not be probed and is not a usable asset.
    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    /// The inspection tool failed or produced unusable output.
    #[error("Probe error: {0}")]
    Probe(String),

    /// The transcoder rejected the request or failed.
    #[error("Edit error: {0}")]
    Edit(String),

    /// An external process could not be run to completion.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Writing asset bytes to the storage area failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The caller cancelled the operation before it finished.
    #[error("Operation cancelled")]
    Cancelled,

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::Policy(_) => 400,
            Error::NotFound { .. } => 404,
            Error::Expired { .. } => 410,
            Error::InvalidMedia(_) => 422,
            Error::Probe(_) | Error::Edit(_) | Error::Tool { .. } => 502,
            Error::Cancelled => 499,
            Error::Storage(_) | Error::Database { .. } | Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// True for failures of the persistence layer (files or records).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Database { .. } | Error::Io { .. }
        )
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Expired`].
    pub fn expired(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::Expired {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Reattribute a raw tool failure to the probe stage. Cancellation passes through.
    pub fn into_probe(self) -> Self {
        match self {
            Error::Cancelled | Error::Probe(_) => self,
            other => Error::Probe(other.to_string()),
        }
    }

    /// Reattribute a raw tool failure to the edit stage. Cancellation passes through.
    pub fn into_edit(self) -> Self {
        match self {
            Error::Cancelled | Error::Edit(_) => self,
            other => Error::Edit(other.to_string()),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
