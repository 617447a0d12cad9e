//! Error types for cask_db

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cask_db operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cask_db operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Compression failed: {0}")]
    Compression(#[source] std::io::Error),

    #[error("IO error during {op} on {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Corrupt object {hash}: {kind}")]
    Corrupt { hash: String, kind: CorruptKind },

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Unknown object kind: {0}")]
    UnknownKind(String),

    #[error("Ref not found: {0}")]
    RefNotFound(String),

    #[error("Invalid ref: {0}")]
    InvalidRef(String),

    #[error("Not a cask repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Repository already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// What exactly was wrong with a corrupt object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptKind {
    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("frame has no NUL separator")]
    MissingSeparator,

    #[error("malformed frame header: {0:?}")]
    BadHeader(String),

    #[error("declared length {declared} but payload is {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("content hashes to {actual}")]
    DigestMismatch { actual: String },

    #[error("not a commit: {0}")]
    NotACommit(String),
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(hash: impl Into<String>, kind: CorruptKind) -> Self {
        Error::Corrupt {
            hash: hash.into(),
            kind,
        }
    }

    /// True when the requested object was never written
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True when an object exists but cannot be trusted
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt { .. })
    }
}
