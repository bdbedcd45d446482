//! Error types for the scheduler

use crate::types::Role;
use thiserror::Error;

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Scheduler errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Malformed input rejected before touching storage
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Password failed the strength policy; carries the first failing
    /// rule's message
    #[error("{0}")]
    WeakPassword(String),

    /// Username already registered for that role
    #[error("Username taken")]
    UsernameTaken,

    /// Caregiver already published this date
    #[error("Availability already published for this date")]
    DuplicateSlot,

    /// Vaccine has never been restocked
    #[error("Unknown vaccine: {0}")]
    UnknownVaccine(String),

    /// Not enough doses to satisfy the request
    #[error("Not enough available doses")]
    InsufficientDoses,

    /// No caregiver has an open slot on the requested date
    #[error("No caregiver is available")]
    NoCaregiverAvailable,

    /// Operation requires an authenticated session
    #[error("Not logged in")]
    NotLoggedIn,

    /// A session can hold at most one identity
    #[error("Already logged in")]
    AlreadyLoggedIn,

    /// Authenticated, but with the wrong role for this operation
    #[error("Operation requires the {required} role")]
    WrongRole {
        /// Role the operation is restricted to
        required: Role,
    },

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
