//! # cask_db
//!
//! A content-addressed object store modeled on the git object database.
//!
//! Payloads are framed as `"<kind> <len>\0<payload>"`, fingerprinted with
//! BLAKE3, compressed with zstd, and written to
//! `objects/<first 2 hex chars>/<remaining hex chars>`.
//!
//! ## Core Concepts
//!
//! - **Objects**: Immutable, typed payloads keyed by the hash of their frame
//! - **Store**: `put` / `get` / `has` over the sharded `objects/` directory
//! - **Commits**: Text objects recording a message, author and parent
//! - **Refs**: `HEAD` and `refs/heads/<branch>` files naming commits
//!
//! ## Example
//!
//! ```no_run
//! use cask_db::{ObjectKind, ObjectStore, StoreConfig};
//!
//! # fn main() -> cask_db::Result<()> {
//! let store = ObjectStore::open(".cask/objects", StoreConfig::default())?;
//! let hash = store.put(b"hello", ObjectKind::Blob)?;
//! let (kind, payload) = store.get(&hash)?;
//! assert_eq!((kind, payload.as_slice()), (ObjectKind::Blob, &b"hello"[..]));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod model;
pub mod refs;
pub mod store;

mod error;
mod repository;

pub use config::StoreConfig;
pub use error::{CorruptKind, Error, Result};
pub use model::{Commit, Frame, Hash, ObjectKind};
pub use refs::Refs;
pub use repository::{FsckReport, Repository};
pub use store::ObjectStore;

/// Default repository directory name
pub const REPO_DIR: &str = ".cask";

/// Object directory inside a repository
pub const OBJECTS_DIR: &str = "objects";

/// HEAD file inside a repository
pub const HEAD_FILE: &str = "HEAD";

/// Branch HEAD points at in a fresh repository
pub const DEFAULT_BRANCH: &str = "master";
