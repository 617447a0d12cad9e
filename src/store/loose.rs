//! Loose object store: one compressed file per object
//!
//! Layout:
//! ```text
//! objects/
//!   <first 2 hex chars>/
//!     <remaining hex chars>    zstd(frame), nothing else
//! ```
//!
//! Writes go to a temp file in the shard directory and are renamed into
//! place, so an object is either fully visible under its final name or not
//! there at all. Readers therefore never need a lock.

use super::codec;
use crate::config::StoreConfig;
use crate::model::{Frame, Hash, ObjectKind, HEX_LEN, SHARD_LEN};
use crate::{CorruptKind, Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

const TEMP_PREFIX: &str = ".tmp-";

/// A content-addressed object store backed by a sharded directory tree
#[derive(Debug, Clone)]
pub struct ObjectStore {
    /// Root `objects/` directory
    objects_dir: PathBuf,
    /// Store-wide settings
    config: StoreConfig,
}

impl ObjectStore {
    /// Open the store rooted at `objects_dir`, creating the directory if needed
    pub fn open(objects_dir: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        fs::create_dir_all(&objects_dir)
            .map_err(|e| Error::io("create objects dir", &objects_dir, e))?;
        Ok(ObjectStore {
            objects_dir,
            config,
        })
    }

    /// Store a payload, returns its hash
    pub fn put(&self, payload: &[u8], kind: ObjectKind) -> Result<Hash> {
        let frame = Frame::new(kind, payload);
        let hash = frame.hash();
        let path = self.object_path(&hash);

        if path.exists() {
            if !self.config.verify_existing {
                debug!(%hash, %kind, "object already stored");
                return Ok(hash);
            }
            match self.verify(&hash) {
                Ok(()) => {
                    debug!(%hash, %kind, "object already stored and verified");
                    return Ok(hash);
                }
                Err(e) if e.is_corrupt() => {
                    warn!(%hash, error = %e, "replacing corrupt object");
                }
                Err(e) => return Err(e),
            }
        }

        let header = frame.header();
        let compressed = codec::compress(&[header.as_bytes(), &[0], payload], &self.config)
            .map_err(Error::Compression)?;

        self.write_atomic(&path, &compressed)?;
        debug!(
            %hash,
            %kind,
            size = payload.len(),
            stored = compressed.len(),
            "stored object"
        );
        Ok(hash)
    }

    /// Retrieve an object's kind and payload, verifying it against `hash`
    pub fn get(&self, hash: &Hash) -> Result<(ObjectKind, Vec<u8>)> {
        let compressed = self.get_raw(hash)?;

        let frame_bytes = codec::decompress(&compressed).map_err(|e| {
            warn!(%hash, error = %e, "object failed to decompress");
            Error::corrupt(hash.to_hex(), CorruptKind::Decompress(e.to_string()))
        })?;

        let actual = Hash::digest(&frame_bytes);
        if actual != *hash {
            warn!(%hash, %actual, "object digest mismatch");
            return Err(Error::corrupt(
                hash.to_hex(),
                CorruptKind::DigestMismatch {
                    actual: actual.to_hex(),
                },
            ));
        }

        let frame = Frame::decode(&frame_bytes).map_err(|kind| {
            warn!(%hash, error = %kind, "object has a malformed frame");
            Error::corrupt(hash.to_hex(), kind)
        })?;

        trace!(%hash, kind = %frame.kind, size = frame.payload.len(), "read object");
        Ok((frame.kind, frame.payload.to_vec()))
    }

    /// The stored (compressed) bytes of an object, unverified
    pub fn get_raw(&self, hash: &Hash) -> Result<Vec<u8>> {
        let path = self.object_path(hash);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFound(hash.to_hex())),
            Err(e) => Err(Error::io("read object", path, e)),
        }
    }

    /// Check if an object exists, without reading it
    pub fn has(&self, hash: &Hash) -> bool {
        self.object_path(hash).is_file()
    }

    /// Run the full read path and discard the payload
    pub fn verify(&self, hash: &Hash) -> Result<()> {
        self.get(hash).map(|_| ())
    }

    /// Iterate over every stored object's hash
    ///
    /// Temp files and names that are not a well-formed fingerprint are
    /// skipped. Order is unspecified.
    pub fn iter(&self) -> Result<impl Iterator<Item = Result<Hash>>> {
        let shards = fs::read_dir(&self.objects_dir)
            .map_err(|e| Error::io("list objects dir", &self.objects_dir, e))?;

        let mut hashes = Vec::new();
        for shard in shards {
            let shard = shard.map_err(|e| Error::io("list objects dir", &self.objects_dir, e))?;
            let shard_name = shard.file_name();
            let Some(prefix) = shard_name.to_str().filter(|n| is_hex(n, SHARD_LEN)) else {
                continue;
            };
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }

            let entries =
                fs::read_dir(&shard_path).map_err(|e| Error::io("list shard", &shard_path, e))?;
            for entry in entries {
                let item = entry
                    .map_err(|e| Error::io("list shard", &shard_path, e))
                    .and_then(|entry| {
                        entry
                            .file_name()
                            .to_str()
                            .filter(|n| is_hex(n, HEX_LEN - SHARD_LEN))
                            .map(|rest| Hash::from_hex(&format!("{prefix}{rest}")))
                            .transpose()
                    })
                    .transpose();
                if let Some(item) = item {
                    hashes.push(item);
                }
            }
        }
        Ok(hashes.into_iter())
    }

    /// Location of an object, whether or not it exists
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        let (shard, rest) = hash.split_hex();
        self.objects_dir.join(shard).join(rest)
    }

    /// Root `objects/` directory
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Write `bytes` to `path` via a temp file in the same directory
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let shard_dir = path
            .parent()
            .ok_or_else(|| Error::io("resolve shard", path, io::ErrorKind::InvalidInput.into()))?;
        fs::create_dir_all(shard_dir).map_err(|e| Error::io("create shard", shard_dir, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(shard_dir)
            .map_err(|e| Error::io("create temp file", shard_dir, e))?;
        trace!(tmp = %tmp.path().display(), "writing temp object");

        tmp.write_all(bytes)
            .map_err(|e| Error::io("write temp file", tmp.path().to_path_buf(), e))?;
        if self.config.fsync {
            tmp.as_file()
                .sync_all()
                .map_err(|e| Error::io("sync temp file", tmp.path().to_path_buf(), e))?;
        }

        // A concurrent writer may have won the race; its bytes are identical.
        tmp.persist(path)
            .map_err(|e| Error::io("rename object", path, e.error))?;
        Ok(())
    }
}

fn is_hex(name: &str, len: usize) -> bool {
    name.len() == len && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &Path) -> ObjectStore {
        ObjectStore::open(dir.join("objects"), StoreConfig::default()).unwrap()
    }

    #[test]
    fn test_put_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let hash = store.put(b"hello", ObjectKind::Blob).unwrap();
        let (kind, payload) = store.get(&hash).unwrap();

        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"hello");
        assert_eq!(hash, Hash::digest(b"blob 5\0hello"));
    }

    #[test]
    fn test_object_path_layout() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let hash = store.put(b"layout", ObjectKind::Blob).unwrap();
        let hex = hash.to_hex();
        let expected = dir
            .path()
            .join("objects")
            .join(&hex[..2])
            .join(&hex[2..]);

        assert_eq!(store.object_path(&hash), expected);
        assert!(expected.is_file());
    }

    #[test]
    fn test_stored_file_is_bare_compressed_frame() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let hash = store.put(b"raw", ObjectKind::Commit).unwrap();
        let raw = store.get_raw(&hash).unwrap();
        assert_eq!(codec::decompress(&raw).unwrap(), b"commit 3\0raw");
    }

    #[test]
    fn test_deduplication() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let hash1 = store.put(b"duplicate data", ObjectKind::Blob).unwrap();
        let hash2 = store.put(b"duplicate data", ObjectKind::Blob).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(store.iter().unwrap().count(), 1);
    }

    #[test]
    fn test_has() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert!(!store.has(&Hash::ZERO));
        let hash = store.put(b"present", ObjectKind::Blob).unwrap();
        assert!(store.has(&hash));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let err = store.get(&Hash::ZERO).unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }

    #[test]
    fn test_get_detects_digest_mismatch() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let real = store.put(b"real", ObjectKind::Blob).unwrap();
        let other = store.put(b"other", ObjectKind::Blob).unwrap();

        // Put `other`'s bytes under `real`'s name
        fs::copy(store.object_path(&other), store.object_path(&real)).unwrap();

        match store.get(&real) {
            Err(Error::Corrupt {
                kind: CorruptKind::DigestMismatch { actual },
                ..
            }) => assert_eq!(actual, other.to_hex()),
            other => panic!("expected digest mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_get_detects_malformed_frame() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        // Well-compressed bytes that are not a frame, stored under their own digest
        let bogus = b"no separator here";
        let hash = Hash::digest(bogus);
        let compressed = codec::compress(&[bogus], store.config()).unwrap();
        let path = store.object_path(&hash);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, compressed).unwrap();

        match store.get(&hash) {
            Err(Error::Corrupt {
                kind: CorruptKind::MissingSeparator,
                ..
            }) => {}
            other => panic!("expected missing separator, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_existing_repairs_corrupt_object() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::builder().verify_existing(true).build();
        let store = ObjectStore::open(dir.path().join("objects"), config).unwrap();

        let hash = store.put(b"repair me", ObjectKind::Blob).unwrap();
        fs::write(store.object_path(&hash), b"junk").unwrap();
        assert!(store.get(&hash).unwrap_err().is_corrupt());

        assert_eq!(store.put(b"repair me", ObjectKind::Blob).unwrap(), hash);
        assert_eq!(store.get(&hash).unwrap().1, b"repair me");
    }

    #[test]
    fn test_iter_skips_foreign_files() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let a = store.put(b"a", ObjectKind::Blob).unwrap();
        let b = store.put(b"b", ObjectKind::Commit).unwrap();

        let (shard, _) = a.split_hex();
        fs::write(store.objects_dir().join(&shard).join(".tmp-stale"), b"x").unwrap();
        fs::write(store.objects_dir().join("README"), b"x").unwrap();
        fs::create_dir_all(store.objects_dir().join("info")).unwrap();

        let mut found: Vec<Hash> = store.iter().unwrap().map(|h| h.unwrap()).collect();
        found.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let hash = store.put(b"tidy", ObjectKind::Blob).unwrap();
        let (shard, _) = hash.split_hex();
        let leftovers: Vec<_> = fs::read_dir(store.objects_dir().join(shard))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(TEMP_PREFIX))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }
}
