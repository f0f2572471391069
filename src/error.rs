use std::path::PathBuf;

/// Failures reading or writing the registry document or its backups.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backup '{0}' not found")]
    BackupNotFound(String),

    #[error("Backup '{0}' already exists")]
    BackupExists(String),

    #[error("Invalid backup name '{0}'")]
    InvalidBackupName(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors returned by the function bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("function '{0}' is not registered in the bridge")]
    NotFound(String),
}
