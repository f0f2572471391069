//! Storage port behind the function bridge.
//!
//! The bridge writes its whole registry as one document after every mutation and
//! reads it back whole. [`FileStore`] keeps that document on disk, [`MemoryStore`]
//! keeps it in a shared buffer so tests can inspect what was written.

use crate::error::StorageError;
use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Fixed file name of the registry document, both live and inside backups.
pub const REGISTRY_FILE_NAME: &str = "bridge-registry.json";

/// Where the registry document lives.
pub trait RegistryStore {
    /// Read the full document. `Ok(None)` means nothing has been written yet.
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the full document.
    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Human-readable location, used in narration and backup metadata.
    fn describe(&self) -> String;
}

/// Registry document stored as `<dir>/bridge-registry.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    file: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let file = dir.join(REGISTRY_FILE_NAME);
        Self { dir, file }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }
}

impl RegistryStore for FileStore {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(&self.file) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&self.file, e)),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        fs::write(&self.file, bytes).map_err(|e| StorageError::io(&self.file, e))
    }

    fn describe(&self) -> String {
        self.file.to_string_lossy().into_owned()
    }
}

/// In-memory registry document.
///
/// Clones share the same buffer, so a handle kept by a test observes every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    buf: Rc<RefCell<Option<Vec<u8>>>>,
    writes: Rc<RefCell<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create a store and a second handle onto the same buffer.
    pub fn with_handle() -> (Self, MemoryStore) {
        let store = MemoryStore::new();
        let handle = store.clone();
        (store, handle)
    }

    /// Current document as text, if any.
    pub fn contents(&self) -> Option<String> {
        self.buf
            .borrow()
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Replace the document directly, bypassing the bridge.
    pub fn set_contents(&self, bytes: impl Into<Vec<u8>>) {
        *self.buf.borrow_mut() = Some(bytes.into());
    }

    /// Number of writes performed through [`RegistryStore::write`].
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl RegistryStore for MemoryStore {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.buf.borrow().clone())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        *self.buf.borrow_mut() = Some(bytes.to_vec());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::env as stdenv;
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn make_unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut p = stdenv::temp_dir();
        p.push(format!("{}_{}_{}", prefix, std::process::id(), nanos));
        fs::create_dir_all(&p).expect("failed to create temp dir");
        p
    }

    #[test]
    fn test_file_store_missing_file_reads_none() {
        let dir = make_unique_temp_dir("spu_store_missing");
        let store = FileStore::new(dir.join("nested"));
        assert!(store.read().unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_creates_directory_on_write() {
        let dir = make_unique_temp_dir("spu_store_write");
        let mut store = FileStore::new(dir.join("nested"));

        store.write(b"{}").unwrap();

        assert_eq!(store.path(), dir.join("nested").join(REGISTRY_FILE_NAME));
        assert_eq!(store.read().unwrap(), Some(b"{}".to_vec()));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_memory_store_handles_share_buffer() {
        let (mut store, handle) = MemoryStore::with_handle();
        assert_eq!(handle.contents(), None);

        store.write(b"abc").unwrap();

        assert_eq!(handle.contents().as_deref(), Some("abc"));
        assert_eq!(handle.write_count(), 1);
    }
}
