//! Core data model types for cask_db

mod commit;
mod frame;
mod hash;
mod kind;

pub use commit::{validate_identity, Commit};
pub use frame::Frame;
pub use hash::{Hash, HASH_LEN, HEX_LEN, SHARD_LEN};
pub use kind::ObjectKind;
