use crate::backup::BackupService;
use crate::bridge::FunctionBridge;
use crate::library::LibraryRegistry;
use crate::storage::{FileStore, RegistryStore};
use crate::store::VirtualStore;
use std::path::PathBuf;

/// Where the engine keeps its files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the live `bridge-registry.json`.
    pub storage_dir: PathBuf,
    /// Directory holding one sub-directory per backup.
    pub backup_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./spu-bridge-storage"),
            backup_root: PathBuf::from("./spu-backups"),
        }
    }
}

/// Everything a command may read or change.
///
/// Owned by the caller (usually an [`Interpreter`](crate::Interpreter)) and passed
/// explicitly to commands and the executor.
///
/// Note: fields are public so commands can borrow the parts they need independently.
pub struct Context {
    pub store: VirtualStore,
    pub libraries: LibraryRegistry,
    pub bridge: FunctionBridge,
    pub backups: BackupService,
    /// Set by `bridge-clear`; the next input line is read as the confirmation.
    pub awaiting_clear_confirmation: bool,
    /// When set to true, indicates that an interactive loop should exit.
    pub should_exit: bool,
}

impl Context {
    /// Build a context with the bridge persisted to files under `config.storage_dir`.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_store(FileStore::new(&config.storage_dir), &config.backup_root)
    }

    /// Build a context over any registry store.
    pub fn with_store(
        store: impl RegistryStore + 'static,
        backup_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store: VirtualStore::new(),
            libraries: LibraryRegistry::new(),
            bridge: FunctionBridge::open(store),
            backups: BackupService::new(backup_root),
            awaiting_clear_confirmation: false,
            should_exit: false,
        }
    }
}
