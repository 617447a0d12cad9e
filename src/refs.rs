//! Branch refs and HEAD
//!
//! ```text
//! HEAD                  "ref: refs/heads/<branch>\n"
//! refs/heads/<branch>   "<hex>\n"
//! ```
//!
//! Ref files are small and rewritten with the same temp-then-rename scheme as
//! objects, so a reader sees either the old or the new target.

use crate::model::Hash;
use crate::{Error, Result, DEFAULT_BRANCH, HEAD_FILE};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const HEAD_PREFIX: &str = "ref: refs/heads/";

/// Reads and writes the ref files of a repository
#[derive(Debug, Clone)]
pub struct Refs {
    root: PathBuf,
}

impl Refs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Refs { root: root.into() }
    }

    /// Create `refs/heads/` and point HEAD at the default branch
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let refs = Refs::new(root);
        let heads = refs.heads_dir();
        fs::create_dir_all(&heads).map_err(|e| Error::io("create refs dir", &heads, e))?;
        refs.set_head(DEFAULT_BRANCH)?;
        Ok(refs)
    }

    /// Get the branch HEAD points at
    pub fn current_branch(&self) -> Result<String> {
        let path = self.root.join(HEAD_FILE);
        let text = fs::read_to_string(&path).map_err(|e| Error::io("read HEAD", &path, e))?;
        let branch = text
            .trim_end()
            .strip_prefix(HEAD_PREFIX)
            .ok_or_else(|| Error::InvalidRef(format!("HEAD: {:?}", text.trim_end())))?;
        validate_branch_name(branch)?;
        Ok(branch.to_string())
    }

    /// Point HEAD at a branch (which need not have commits yet)
    pub fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        let path = self.root.join(HEAD_FILE);
        write_atomic(&path, format!("{HEAD_PREFIX}{branch}\n").as_bytes())?;
        debug!(branch, "HEAD updated");
        Ok(())
    }

    /// Get the commit hash for a branch, `None` if it has no commits
    pub fn read(&self, branch: &str) -> Result<Option<Hash>> {
        validate_branch_name(branch)?;
        let path = self.branch_path(branch);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io("read ref", path, e)),
        };
        Hash::from_hex(text.trim_end())
            .map(Some)
            .map_err(|_| Error::InvalidRef(format!("{branch}: {:?}", text.trim_end())))
    }

    /// Set a branch to point to a commit
    pub fn update(&self, branch: &str, commit_hash: Hash) -> Result<()> {
        validate_branch_name(branch)?;
        let path = self.branch_path(branch);
        write_atomic(&path, format!("{commit_hash}\n").as_bytes())?;
        debug!(branch, %commit_hash, "ref updated");
        Ok(())
    }

    /// Create a new branch at the given commit
    pub fn create_branch(&self, name: &str, commit_hash: Hash) -> Result<()> {
        if self.read(name)?.is_some() {
            return Err(Error::InvalidRef(format!("branch '{name}' already exists")));
        }
        self.update(name, commit_hash)
    }

    /// Get the current HEAD commit hash
    pub fn head_commit(&self) -> Result<Option<Hash>> {
        self.read(&self.current_branch()?)
    }

    /// List all branches that have commits, sorted by name
    pub fn list(&self) -> Result<Vec<(String, Hash)>> {
        let heads = self.heads_dir();
        let mut out = Vec::new();
        collect_refs(&heads, "", &mut out)?;
        let mut refs = Vec::with_capacity(out.len());
        for name in out {
            if let Some(hash) = self.read(&name)? {
                refs.push((name, hash));
            }
        }
        refs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(refs)
    }

    fn heads_dir(&self) -> PathBuf {
        self.root.join("refs").join("heads")
    }

    fn branch_path(&self, branch: &str) -> PathBuf {
        self.heads_dir().join(branch)
    }
}

/// Walk `refs/heads`, collecting `a/b`-style names; temp files are skipped
fn collect_refs(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io("list refs", dir, e)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("list refs", dir, e))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let full = format!("{prefix}{name}");
        let path = entry.path();
        if path.is_dir() {
            collect_refs(&path, &format!("{full}/"), out)?;
        } else {
            out.push(full);
        }
    }
    Ok(())
}

/// Reject names that would escape `refs/heads` or confuse the file layout
pub fn validate_branch_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('/')
        || name.ends_with('/')
        || name.starts_with('.')
        || name.contains("..")
        || name.contains("//")
        || name.contains("/.")
        || name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '\\');
    if bad {
        return Err(Error::InvalidRef(format!("invalid branch name {name:?}")));
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::io("resolve ref dir", path, io::ErrorKind::InvalidInput.into()))?;
    fs::create_dir_all(dir).map_err(|e| Error::io("create ref dir", dir, e))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(dir)
        .map_err(|e| Error::io("create temp ref", dir, e))?;
    tmp.write_all(bytes)
        .map_err(|e| Error::io("write temp ref", tmp.path().to_path_buf(), e))?;
    tmp.persist(path)
        .map_err(|e| Error::io("rename ref", path, e.error))?;
    Ok(())
}
