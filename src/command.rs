use crate::context::Context;
use anyhow::Result;
use std::io::Write;

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by `simulate`.
pub trait ExecutableCommand {
    /// Executes the command, writing its narration to `out`.
    fn execute(self: Box<Self>, out: &mut dyn Write, ctx: &mut Context) -> Result<()>;
}

/// Factory that tries to create a command from a name and the rest of the line.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance. `payload` is the raw text after the name.
    fn try_create(&self, name: &str, payload: &str) -> Option<Box<dyn ExecutableCommand>>;
}
