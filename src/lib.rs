//! A small shell that narrates what short snippets of code would do.
//!
//! Nothing is really executed. Each line of a snippet is classified into an
//! [`Action`] by a flat, per-line classifier ([`parser`]), and the [`executor`] walks
//! those actions against a virtual variable store, a registry of simulated
//! libraries and a cross-language [`FunctionBridge`]. The bridge persists the
//! functions it knows about as a JSON document and can be backed up and restored.
//!
//! The main entry point is [`Interpreter`], whose
//! [`run_command`](Interpreter::run_command) takes one line of input and returns the
//! narration it produced. All state lives in an explicit [`Context`].

pub mod action;
pub mod backup;
pub mod bridge;
mod builtin;
pub mod command;
pub mod context;
pub mod error;
pub mod executor;
mod interpreter;
pub mod library;
pub mod parser;
mod simulate;
pub mod storage;
pub mod store;

pub use action::{Action, ActionKind, Language};
pub use backup::{Backup, BackupService};
pub use bridge::{CallResult, FunctionBridge, FunctionDescriptor, FunctionSpec};
pub use context::{Context, EngineConfig};
pub use error::{BridgeError, StorageError};
pub use interpreter::Interpreter;
pub use storage::{FileStore, MemoryStore, RegistryStore};
