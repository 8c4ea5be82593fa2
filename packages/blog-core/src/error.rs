//! Blog store error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of resource an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Post,
    Category,
}

impl ResourceKind {
    /// Lower-case name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Post => "post",
            ResourceKind::Category => "category",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blog store operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlogError {
    /// Referenced post or category does not exist
    #[error("Could not find resource of type {resource}")]
    NotFound { resource: ResourceKind, id: u64 },

    /// Input failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Fixture document is inconsistent
    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),

    /// No ids left to hand out
    #[error("No {resource} ids left to assign")]
    IdExhausted { resource: ResourceKind },

    /// Runtime request queue is full
    #[error("Request queue full ({capacity} pending requests)")]
    Overloaded { capacity: usize },
}

impl BlogError {
    /// Shorthand for a missing post.
    pub fn post_not_found(id: u64) -> Self {
        BlogError::NotFound {
            resource: ResourceKind::Post,
            id,
        }
    }

    /// Shorthand for a missing category.
    pub fn category_not_found(id: u64) -> Self {
        BlogError::NotFound {
            resource: ResourceKind::Category,
            id,
        }
    }
}

impl From<serde_json::Error> for BlogError {
    fn from(e: serde_json::Error) -> Self {
        BlogError::SerializationError(e.to_string())
    }
}
