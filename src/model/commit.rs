//! Commit type - a message and author stamped onto the history of a branch

use super::{Hash, ObjectKind};
use crate::{CorruptKind, Error, Result};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// A commit records who changed a branch, when, and why
///
/// Stored as text with [`ObjectKind::Commit`]:
///
/// ```text
/// tree <hex>
/// parent <hex>
/// author <ident> <unix-seconds> +0000
/// committer <ident> <unix-seconds> +0000
///
/// <message>
/// ```
///
/// The `tree` and `parent` lines are present only when set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Commit {
    /// Root tree, once a tree builder exists
    pub tree: Option<Hash>,

    /// Previous tip of the branch (none for the first commit)
    pub parent: Option<Hash>,

    /// Author identity, e.g. `Jane Doe <jane@example.com>`
    pub author: String,

    /// Committer identity
    pub committer: String,

    /// Timestamp (unix seconds)
    pub timestamp: u64,

    /// Human-readable message describing this commit
    pub message: String,
}

impl Commit {
    /// Create a new commit stamped with the current time
    pub fn new(message: impl Into<String>, author: impl Into<String>) -> Self {
        let author = author.into();
        Commit {
            tree: None,
            parent: None,
            committer: author.clone(),
            author,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            message: message.into(),
        }
    }

    pub fn with_parent(mut self, parent: Hash) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_tree(mut self, tree: Hash) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn kind() -> ObjectKind {
        ObjectKind::Commit
    }

    /// Render the commit payload
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        if let Some(tree) = &self.tree {
            out.push_str(&format!("tree {tree}\n"));
        }
        if let Some(parent) = &self.parent {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {} {} +0000\n", self.author, self.timestamp));
        out.push_str(&format!(
            "committer {} {} +0000\n",
            self.committer, self.timestamp
        ));
        out.push('\n');
        out.push_str(&self.message);
        out.push('\n');
        out.into_bytes()
    }

    /// Parse a commit payload
    ///
    /// `hash` only labels the error if the payload is malformed.
    pub fn parse(hash: &Hash, bytes: &[u8]) -> Result<Self> {
        let bad = |why: &str| Error::corrupt(hash.to_hex(), CorruptKind::NotACommit(why.into()));

        let text = std::str::from_utf8(bytes).map_err(|_| bad("not UTF-8"))?;
        let (head, message) = text.split_once("\n\n").ok_or_else(|| bad("no message"))?;

        let mut tree = None;
        let mut parent = None;
        let mut author = None;
        let mut committer = None;

        for line in head.lines() {
            let (key, value) = line.split_once(' ').ok_or_else(|| bad(line))?;
            match key {
                "tree" => tree = Some(Hash::from_hex(value).map_err(|_| bad(line))?),
                "parent" => parent = Some(Hash::from_hex(value).map_err(|_| bad(line))?),
                "author" => author = Some(parse_signature(value).ok_or_else(|| bad(line))?),
                "committer" => committer = Some(parse_signature(value).ok_or_else(|| bad(line))?),
                _ => return Err(bad(line)),
            }
        }

        let (author, timestamp) = author.ok_or_else(|| bad("missing author"))?;
        let (committer, _) = committer.ok_or_else(|| bad("missing committer"))?;

        Ok(Commit {
            tree,
            parent,
            author,
            committer,
            timestamp,
            message: message.strip_suffix('\n').unwrap_or(message).to_string(),
        })
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Reject identities that cannot be written on a single header line
///
/// Allowed: `Name` or `Name <email>`, with no line breaks, NUL or other
/// control characters, and at most one `<...>` block closing the identity.
pub fn validate_identity(ident: &str) -> Result<()> {
    let bad = |why: &str| Err(Error::InvalidInput(format!("identity {ident:?}: {why}")));

    if ident.trim().is_empty() {
        return bad("empty");
    }
    if ident.chars().any(char::is_control) {
        return bad("contains a control character");
    }

    let opens = ident.matches('<').count();
    let closes = ident.matches('>').count();
    match (opens, closes) {
        (0, 0) => Ok(()),
        (1, 1) if ident.ends_with('>') && ident.find('<') < ident.find('>') => Ok(()),
        _ => bad("expected `Name` or `Name <email>`"),
    }
}

/// Split `<ident> <seconds> <zone>` into identity and timestamp
fn parse_signature(value: &str) -> Option<(String, u64)> {
    let (rest, _zone) = value.rsplit_once(' ')?;
    let (ident, seconds) = rest.rsplit_once(' ')?;
    Some((ident.to_string(), seconds.parse().ok()?))
}
