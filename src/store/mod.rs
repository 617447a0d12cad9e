//! Content-addressed object store
//!
//! This module implements the core storage layer using content-addressed
//! loose objects. Objects are keyed by the BLAKE3 hash of their frame and
//! compressed with zstd.

mod codec;
mod loose;

pub use codec::{compress, decompress};
pub use loose::ObjectStore;
