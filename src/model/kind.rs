//! Object kind tag

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type tag carried in every object's frame header
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Opaque file content
    Blob,
    /// A commit record
    Commit,
    /// Reserved for a future tree builder
    Tree,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
        }
    }

    pub fn from_bytes(b: &[u8]) -> Option<Self> {
        match b {
            b"blob" => Some(ObjectKind::Blob),
            b"commit" => Some(ObjectKind::Commit),
            b"tree" => Some(ObjectKind::Tree),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ObjectKind::from_bytes(s.as_bytes()).ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        for kind in [ObjectKind::Blob, ObjectKind::Commit, ObjectKind::Tree] {
            assert_eq!(kind.as_str().parse::<ObjectKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert!(matches!("Blob".parse::<ObjectKind>(), Err(Error::UnknownKind(_))));
        assert!(matches!("tag".parse::<ObjectKind>(), Err(Error::UnknownKind(_))));
        assert!(matches!("".parse::<ObjectKind>(), Err(Error::UnknownKind(_))));
    }
}
