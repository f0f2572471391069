use crate::command::{CommandFactory, ExecutableCommand};
use crate::context::Context;
use crate::interpreter::Factory;
use crate::simulate::run_simulation;
use anyhow::{Context as _, Result};
use argh::{EarlyExit, FromArgs};
use chrono::Local;
use std::fs;
use std::io::Write;

/// Exact answer `bridge-clear` waits for before wiping the registry.
pub const CLEAR_CONFIRMATION: &str = "CONFIRM";

/// How many entries `bridge-stats` shows in its "most called" list.
const TOP_CALLED: usize = 5;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) from the
/// whitespace-separated words after the command name.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "load" or "bridge-stats".
    fn name() -> &'static str;

    /// Executes the command, writing narration to `out`.
    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        match T::execute(*self, out, ctx) {
            Ok(()) => Ok(()),
            Err(e) => {
                writeln!(out, "{}: {:#}", T::name(), e)?;
                Ok(())
            }
        }
    }
}

/// Usage errors and `--help` output produced by argh.
struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, out: &mut dyn Write, _ctx: &mut Context) -> Result<()> {
        writeln!(out, "{}", self.output.trim_end())?;
        Ok(())
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, payload: &str) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        let args: Vec<&str> = payload.split_whitespace().collect();
        Some(match T::from_args(&[name], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, .. }) => Box::new(InvalidArgs { output }),
        })
    }
}

#[derive(FromArgs)]
/// Load a simulated library so `library.method(...)` calls resolve to it.
pub struct Load {
    #[argh(positional)]
    /// name of the library to load.
    pub library: String,
}

impl BuiltinCommand for Load {
    fn name() -> &'static str {
        "load"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        if ctx.libraries.load(&self.library) {
            writeln!(out, "library '{}' loaded", self.library)?;
        } else {
            writeln!(out, "library '{}' is already loaded", self.library)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Show the variables held in virtual memory.
pub struct Status {}

impl BuiltinCommand for Status {
    fn name() -> &'static str {
        "status"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        let status = ctx.store.status();
        writeln!(out, "variables: {}", status.total_variables)?;
        for (key, value) in status.variables {
            writeln!(out, "   {} = {}", key, value)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Read a file and simulate its contents.
pub struct RunFile {
    #[argh(positional)]
    /// path of the source file.
    pub path: String,
}

impl BuiltinCommand for RunFile {
    fn name() -> &'static str {
        "run-file"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        let code = fs::read_to_string(&self.path)
            .with_context(|| format!("can't read {}", self.path))?;
        run_simulation(&code, out, ctx)?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Show how many functions the bridge holds and which are called most.
pub struct BridgeStats {}

impl BuiltinCommand for BridgeStats {
    fn name() -> &'static str {
        "bridge-stats"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        let stats = ctx.bridge.get_stats();

        writeln!(out, "cross-language bridge statistics")?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "total functions: {}", stats.total_functions)?;

        writeln!(out, "\nby language:")?;
        for (lang, count) in &stats.by_language {
            writeln!(out, "   {}: {} functions", lang, count)?;
        }

        writeln!(out, "\nmost called:")?;
        for (i, usage) in stats.most_called.iter().take(TOP_CALLED).enumerate() {
            writeln!(
                out,
                "   {}. {} ({}): {} calls",
                i + 1,
                usage.name,
                usage.lang,
                usage.calls
            )?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// List the functions registered in the bridge.
pub struct BridgeList {}

impl BuiltinCommand for BridgeList {
    fn name() -> &'static str {
        "bridge-list"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        let functions = ctx.bridge.list_functions();
        if functions.is_empty() {
            writeln!(out, "no functions registered")?;
            return Ok(());
        }
        for f in functions {
            writeln!(
                out,
                "   {}({}) [{}]: {} calls, last called {}",
                f.name, f.params, f.lang, f.call_count, f.last_called
            )?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Remove every function from the bridge. Asks for confirmation first.
pub struct BridgeClear {}

impl BuiltinCommand for BridgeClear {
    fn name() -> &'static str {
        "bridge-clear"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        ctx.awaiting_clear_confirmation = true;
        writeln!(
            out,
            "are you sure you want to remove ALL functions from the bridge?"
        )?;
        writeln!(out, "   type \"{}\" to proceed:", CLEAR_CONFIRMATION)?;
        Ok(())
    }
}

/// Second half of `bridge-clear`: `answer` is the line typed after the prompt.
pub(crate) fn confirm_clear(answer: &str, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
    if answer != CLEAR_CONFIRMATION {
        writeln!(out, "operation cancelled")?;
        return Ok(());
    }
    match ctx.bridge.clear_registry() {
        Ok(count) => writeln!(out, "{} functions removed from the bridge", count)?,
        Err(e) => writeln!(out, "error clearing the bridge: {}", e)?,
    }
    Ok(())
}

#[derive(FromArgs)]
/// Remove one function from the bridge.
pub struct BridgeRemove {
    #[argh(positional)]
    /// name of the function to remove.
    pub name: String,
}

impl BuiltinCommand for BridgeRemove {
    fn name() -> &'static str {
        "bridge-remove"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        if ctx.bridge.unregister_function(&self.name)? {
            writeln!(out, "function '{}' removed from the bridge", self.name)?;
        } else {
            writeln!(out, "function '{}' not found", self.name)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Write the bridge registry to storage now.
pub struct BridgeSave {}

impl BuiltinCommand for BridgeSave {
    fn name() -> &'static str {
        "bridge-save"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        ctx.bridge.save_to_storage()?;
        writeln!(out, "bridge state saved")?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Copy the current bridge registry into a named backup.
pub struct BridgeBackup {
    #[argh(positional)]
    /// backup name; defaults to one derived from the current time.
    pub name: Option<String>,
}

impl BuiltinCommand for BridgeBackup {
    fn name() -> &'static str {
        "bridge-backup"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        let path = ctx
            .backups
            .create_backup(&mut ctx.bridge, self.name.as_deref())?;
        writeln!(out, "backup created: {}", path.display())?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Replace the bridge registry with a backup.
pub struct BridgeRestore {
    #[argh(positional)]
    /// name of the backup to restore.
    pub name: String,
}

impl BuiltinCommand for BridgeRestore {
    fn name() -> &'static str {
        "bridge-restore"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        let loaded = ctx.backups.restore_backup(&mut ctx.bridge, &self.name)?;
        writeln!(
            out,
            "backup '{}' restored, {} functions loaded",
            self.name, loaded
        )?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// List available backups, newest first.
pub struct BridgeListBackups {}

impl BuiltinCommand for BridgeListBackups {
    fn name() -> &'static str {
        "bridge-list-backups"
    }

    fn execute(self, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        let backups = ctx.backups.list_backups();

        writeln!(out, "available backups:")?;
        writeln!(out, "{}", "=".repeat(50))?;
        if backups.is_empty() {
            writeln!(out, "   no backups found")?;
            return Ok(());
        }
        for (i, backup) in backups.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, backup.name)?;
            writeln!(
                out,
                "   created: {}",
                backup
                    .created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
            )?;
            writeln!(
                out,
                "   size: {} KB",
                (backup.size_bytes as f64 / 1024.0).round() as u64
            )?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// List the available commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, out: &mut dyn Write, _ctx: &mut Context) -> Result<()> {
        let commands = [
            ("load <lib>", "load a simulated library"),
            ("status", "show virtual memory"),
            ("simulate <code>", "simulate a snippet of code"),
            ("run-file <path>", "simulate the contents of a file"),
            ("bridge-stats", "bridge statistics"),
            ("bridge-list", "list registered functions"),
            ("bridge-clear", "remove all functions (asks for confirmation)"),
            ("bridge-remove <name>", "remove one function"),
            ("bridge-save", "save the bridge registry"),
            ("bridge-backup [name]", "back up the bridge registry"),
            ("bridge-restore <name>", "restore a backup"),
            ("bridge-list-backups", "list backups"),
            ("help", "show this list"),
            ("exit", "leave the shell"),
        ];
        writeln!(out, "available commands:")?;
        for (usage, description) in commands {
            writeln!(out, "   {:<24} {}", usage, description)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Leave the interactive shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        ctx.should_exit = true;
        Ok(())
    }
}
