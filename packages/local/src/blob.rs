//! Blob store backends: an in-process map and a directory of files.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::{fs, io, path};

use bytes::Bytes;

use topicbus_sync::{BlobError, BlobStore};

/// An in-process blob store backed by a shared map.
///
/// Clones share the same underlying map, so one instance can be handed
/// to a hub while another observes or seeds the stored blobs. Useful as
/// the local-storage analogue in tests and single-process embeddings.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Rc<RefCell<BTreeMap<String, Bytes>>>,
}

impl MemoryBlobStore {
    pub fn new() -> MemoryBlobStore {
        MemoryBlobStore::default()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.borrow().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&mut self, key: &str) -> Result<Option<Bytes>, BlobError> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, data: Bytes) -> Result<(), BlobError> {
        self.blobs.borrow_mut().insert(key.to_string(), data);
        Ok(())
    }
}

/// A blob store that keeps each blob as one file under a root
/// directory.
///
/// Keys map directly to file names, so they must be a single path
/// component: non-empty, no separators, and not `.` or `..`.
pub struct DiskBlobStore {
    root: path::PathBuf,
}

impl DiskBlobStore {
    /// Open a store rooted at an existing, writable directory.
    pub fn new(root: path::PathBuf) -> Result<DiskBlobStore, BlobError> {
        let attr = fs::metadata(&root)?;

        if !attr.is_dir() {
            return Err(BlobError::Io(io::Error::other(
                "root path must be a directory",
            )));
        }

        if attr.permissions().readonly() {
            return Err(BlobError::Io(io::Error::other(
                "root directory must be writable",
            )));
        }

        Ok(DiskBlobStore {
            root: root.canonicalize()?,
        })
    }

    fn key_to_file_path(&self, key: &str) -> Result<path::PathBuf, BlobError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\', path::MAIN_SEPARATOR]);
        if !valid {
            return Err(BlobError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(key))
    }
}

impl BlobStore for DiskBlobStore {
    fn get(&mut self, key: &str) -> Result<Option<Bytes>, BlobError> {
        let file_path = self.key_to_file_path(key)?;
        tracing::debug!(path = %file_path.display(), "reading blob");
        match fs::read(&file_path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(BlobError::Io(error)),
        }
    }

    fn set(&mut self, key: &str, data: Bytes) -> Result<(), BlobError> {
        let file_path = self.key_to_file_path(key)?;
        tracing::debug!(path = %file_path.display(), bytes = data.len(), "writing blob");
        fs::write(&file_path, &data)?;
        Ok(())
    }
}

#[cfg(test)]
mod memory_blob_store_tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut store = MemoryBlobStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", Bytes::from_static(b"v1")).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(Bytes::from_static(b"v1")));

        store.set("k", Bytes::from_static(b"v2")).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(Bytes::from_static(b"v2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clones_share_the_map() {
        let mut writer = MemoryBlobStore::new();
        let mut reader = writer.clone();

        writer.set("shared", Bytes::from_static(b"x")).unwrap();
        assert_eq!(
            reader.get("shared").unwrap(),
            Some(Bytes::from_static(b"x"))
        );
    }
}
