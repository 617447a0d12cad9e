//! High-level Repository API
//!
//! This module provides the main entry point for interacting with a cask
//! repository: the object store plus the refs that name commits in it.

use crate::config::StoreConfig;
use crate::model::{validate_identity, Commit, Hash, ObjectKind};
use crate::refs::Refs;
use crate::store::ObjectStore;
use crate::{CorruptKind, Error, Result, HEAD_FILE, OBJECTS_DIR};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A repository directory
///
/// ```text
/// <root>/
///   HEAD
///   objects/
///   refs/heads/
/// ```
pub struct Repository {
    root: PathBuf,
    store: ObjectStore,
    refs: Refs,
}

/// Outcome of checking every object in the store
#[derive(Debug, Default, Serialize)]
pub struct FsckReport {
    /// Number of objects examined
    pub checked: usize,
    /// Objects that failed verification, with the reason
    pub corrupt: Vec<(Hash, String)>,
}

impl FsckReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty()
    }
}

impl Repository {
    /// Create a new repository at the given path
    pub fn init(root: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.join(HEAD_FILE).exists() {
            return Err(Error::AlreadyExists(root));
        }
        let store = ObjectStore::open(root.join(OBJECTS_DIR), config)?;
        let refs = Refs::init(&root)?;
        info!(root = %root.display(), "initialized repository");
        Ok(Repository { root, store, refs })
    }

    /// Open an existing repository
    pub fn open(root: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.join(HEAD_FILE).is_file() || !root.join(OBJECTS_DIR).is_dir() {
            return Err(Error::NotARepository(root));
        }
        let store = ObjectStore::open(root.join(OBJECTS_DIR), config)?;
        let refs = Refs::new(&root);
        Ok(Repository { root, store, refs })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Store a file's contents as a blob
    pub fn add_file(&self, path: impl AsRef<Path>) -> Result<Hash> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|e| Error::io("read file", path, e))?;
        self.store.put(&content, ObjectKind::Blob)
    }

    /// Commit on top of the current branch and advance it
    ///
    /// The author is checked before anything is written, so a rejected
    /// identity leaves both the store and the branch untouched.
    pub fn commit(&self, message: &str, author: &str) -> Result<Hash> {
        validate_identity(author)?;
        let branch = self.refs.current_branch()?;
        let mut commit = Commit::new(message, author);
        if let Some(parent) = self.refs.read(&branch)? {
            commit = commit.with_parent(parent);
        }

        let commit_hash = self.store.put(&commit.to_bytes(), Commit::kind())?;
        self.refs.update(&branch, commit_hash)?;
        info!(%branch, %commit_hash, "committed");
        Ok(commit_hash)
    }

    /// Read and parse a commit object
    pub fn read_commit(&self, hash: &Hash) -> Result<Commit> {
        let (kind, payload) = self.store.get(hash)?;
        if kind != ObjectKind::Commit {
            return Err(Error::corrupt(
                hash.to_hex(),
                CorruptKind::NotACommit(format!("object is a {kind}")),
            ));
        }
        Commit::parse(hash, &payload)
    }

    /// The commit at the tip of the current branch
    pub fn head(&self) -> Result<Option<(Hash, Commit)>> {
        match self.refs.head_commit()? {
            Some(hash) => Ok(Some((hash, self.read_commit(&hash)?))),
            None => Ok(None),
        }
    }

    /// Create a branch at the current HEAD commit
    pub fn create_branch(&self, name: &str) -> Result<Hash> {
        let head = self
            .refs
            .head_commit()?
            .ok_or_else(|| Error::RefNotFound("HEAD has no commits yet".into()))?;
        self.refs.create_branch(name, head)?;
        Ok(head)
    }

    /// Switch HEAD to an existing branch
    pub fn checkout(&self, name: &str) -> Result<Hash> {
        let tip = self
            .refs
            .read(name)?
            .ok_or_else(|| Error::RefNotFound(name.to_string()))?;
        self.refs.set_head(name)?;
        Ok(tip)
    }

    /// Verify every object in the store
    pub fn fsck(&self) -> Result<FsckReport> {
        let mut report = FsckReport::default();
        for hash in self.store.iter()? {
            let hash = hash?;
            report.checked += 1;
            match self.store.verify(&hash) {
                Ok(()) => {}
                Err(e) if e.is_corrupt() => {
                    warn!(%hash, error = %e, "fsck found corrupt object");
                    report.corrupt.push((hash, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }
}
