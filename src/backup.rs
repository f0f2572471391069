//! Point-in-time copies of the bridge registry.
//!
//! Layout: `<root>/<backup name>/bridge-registry.json`. Each backup is a full copy of
//! the registry document and never changes after it is written.

use crate::bridge::{FunctionBridge, now_millis};
use crate::error::StorageError;
use crate::storage::REGISTRY_FILE_NAME;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub source_file_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BackupService {
    root: PathBuf,
}

impl BackupService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist the bridge, then copy its registry document into a new backup directory.
    ///
    /// Without a name, `backup_<epoch millis>` is used. Returns the path of the copy.
    /// An existing backup is never overwritten. A failure part way through leaves
    /// whatever was already created in place.
    pub fn create_backup(
        &self,
        bridge: &mut FunctionBridge,
        name: Option<&str>,
    ) -> Result<PathBuf, StorageError> {
        let name = match name {
            Some(n) => validate_name(n)?.to_string(),
            None => format!("backup_{}", now_millis()),
        };
        let dir = self.root.join(&name);
        let file = dir.join(REGISTRY_FILE_NAME);
        if file.exists() {
            return Err(StorageError::BackupExists(name));
        }
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        bridge.save_to_storage()?;
        let bytes = bridge.store().read()?.unwrap_or_default();

        fs::write(&file, bytes).map_err(|e| StorageError::io(&file, e))?;
        log::info!(
            "backup '{}' created from {}",
            name,
            bridge.store().describe()
        );
        Ok(file)
    }

    /// All valid backups, newest first.
    ///
    /// Directories without a registry document are skipped. A missing root is an
    /// empty list.
    pub fn list_backups(&self) -> Vec<Backup> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("backup root {} not readable: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut backups = Vec::new();
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_dir() {
                continue;
            }
            let file = entry.path().join(REGISTRY_FILE_NAME);
            let Ok(file_meta) = fs::metadata(&file) else {
                continue;
            };
            if !file_meta.is_file() {
                continue;
            }
            let created_at = meta
                .created()
                .or_else(|_| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            backups.push(Backup {
                name: entry.file_name().to_string_lossy().into_owned(),
                created_at,
                size_bytes: file_meta.len(),
                source_file_path: file,
            });
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        backups
    }

    /// Copy the named backup over the live registry and reload the bridge from it.
    ///
    /// Returns the number of functions loaded. Not transactional: once the copy has
    /// been written the previous live document is gone.
    pub fn restore_backup(
        &self,
        bridge: &mut FunctionBridge,
        name: &str,
    ) -> Result<usize, StorageError> {
        let file = self.root.join(validate_name(name)?).join(REGISTRY_FILE_NAME);
        let bytes = match fs::read(&file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::BackupNotFound(name.to_string()));
            }
            Err(e) => return Err(StorageError::io(&file, e)),
        };

        bridge.store_mut().write(&bytes)?;
        let loaded = bridge.load_from_storage();
        log::info!("backup '{}' restored, {} functions", name, loaded);
        Ok(loaded)
    }
}

/// Backup names are single directory names.
fn validate_name(name: &str) -> Result<&str, StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if invalid {
        return Err(StorageError::InvalidBackupName(name.to_string()));
    }
    Ok(name)
}
