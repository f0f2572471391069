use crate::builtin::confirm_clear;
use crate::command::CommandFactory;
use crate::context::{Context, EngineConfig};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};
use std::io::Write;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and `simulate`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The command dispatcher of the simulated programming shell.
///
/// The interpreter owns a [`Context`] and a list of [`CommandFactory`] objects that
/// are queried, in order, to create a command from the first word of a line.
///
/// Example
/// ```
/// use spu_shell::{Context, Interpreter, MemoryStore};
/// let ctx = Context::with_store(MemoryStore::new(), std::env::temp_dir());
/// let mut sh = Interpreter::with_context(ctx);
/// let narration = sh.run_command("simulate x = 5");
/// assert!(narration.contains("assigning: x = 5"));
/// ```
pub struct Interpreter {
    ctx: Context,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(ctx: Context, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { ctx, commands }
    }

    /// Create an interpreter over `ctx` with every built-in command.
    pub fn with_context(ctx: Context) -> Self {
        Self::new(ctx, default_commands())
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Run one line of input and return the narration it produced.
    ///
    /// Never fails: unknown commands and command errors are narrated.
    pub fn run_command(&mut self, line: &str) -> String {
        let mut out = Vec::new();
        if let Err(e) = self.dispatch(line, &mut out) {
            let _ = writeln!(out, "error executing command '{}': {:#}", line.trim(), e);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    fn dispatch(&mut self, line: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let line = line.trim();

        if self.ctx.awaiting_clear_confirmation {
            self.ctx.awaiting_clear_confirmation = false;
            return confirm_clear(line, out, &mut self.ctx);
        }
        if line.is_empty() {
            return Ok(());
        }

        log::debug!("interpreting command: {}", line);
        let (name, payload) = match line.split_once(char::is_whitespace) {
            Some((name, payload)) => (name, payload.trim_start()),
            None => (line, ""),
        };

        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(name, payload) {
                return cmd.execute(out, &mut self.ctx);
            }
        }
        writeln!(out, "command not recognized: {}", line)?;
        Ok(())
    }

    /// Interactive Read-Eval-Print Loop until `exit`, Ctrl-C or end of input.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.ctx.should_exit {
            let prompt = if self.ctx.awaiting_clear_confirmation {
                "> "
            } else {
                "spu> "
            };
            match rl.readline(prompt) {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    print!("{}", self.run_command(&line));
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("Eof");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter over files at the default [`EngineConfig`] locations.
    fn default() -> Self {
        Self::with_context(Context::new(&EngineConfig::default()))
    }
}

fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    use crate::simulate::Simulate;
    vec![
        Box::new(Factory::<Load>::default()),
        Box::new(Factory::<Status>::default()),
        Box::new(Factory::<Simulate>::default()),
        Box::new(Factory::<RunFile>::default()),
        Box::new(Factory::<BridgeStats>::default()),
        Box::new(Factory::<BridgeList>::default()),
        Box::new(Factory::<BridgeClear>::default()),
        Box::new(Factory::<BridgeRemove>::default()),
        Box::new(Factory::<BridgeSave>::default()),
        Box::new(Factory::<BridgeBackup>::default()),
        Box::new(Factory::<BridgeRestore>::default()),
        Box::new(Factory::<BridgeListBackups>::default()),
        Box::new(Factory::<Help>::default()),
        Box::new(Factory::<Exit>::default()),
    ]
}

#[cfg(test)]
mod command_tests {
    use crate::storage::MemoryStore;
    use crate::storage::tests::make_unique_temp_dir;
    use crate::{Context, Interpreter};
    use std::fs;

    fn shell() -> (Interpreter, MemoryStore, std::path::PathBuf) {
        let dir = make_unique_temp_dir("spu_interpreter");
        let (store, handle) = MemoryStore::with_handle();
        let ctx = Context::with_store(store, dir.join("backups"));
        (Interpreter::with_context(ctx), handle, dir)
    }

    #[test]
    fn test_simulate_multi_line_payload() {
        let (mut sh, _, dir) = shell();

        let s = sh.run_command("simulate x = 5\nprint(x)");

        assert!(s.starts_with("simulating code: x = 5\nprint(x)\n"));
        assert!(s.contains("  assigning: x = 5\n"));
        assert!(s.contains("    output: x\n"));
        assert_eq!(sh.context().store.get_var("x"), Some("5"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unrecognized_command_changes_nothing() {
        let (mut sh, handle, dir) = shell();

        let s = sh.run_command("teleport now");

        assert_eq!(s, "command not recognized: teleport now\n");
        assert!(sh.context().store.is_empty());
        assert_eq!(handle.write_count(), 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_line_is_silent() {
        let (mut sh, _, dir) = shell();
        assert_eq!(sh.run_command("   "), "");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_argument_is_narrated() {
        let (mut sh, _, dir) = shell();

        let s = sh.run_command("load");

        assert!(s.contains("library"), "got {:?}", s);
        assert!(sh.context().libraries.loaded().next().is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_then_call_library_method() {
        let (mut sh, _, dir) = shell();

        assert_eq!(sh.run_command("load math"), "library 'math' loaded\n");
        let s = sh.run_command("simulate math.exampleMethod(2, 3)");

        assert!(s.contains("Executed math.exampleMethod with arguments: 2, 3"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_define_call_and_stats() {
        let (mut sh, _, dir) = shell();

        sh.run_command("simulate def add(a, b):\nadd(3, 4)\nadd(1, 1)");
        let s = sh.run_command("bridge-stats");

        assert!(s.contains("total functions: 1\n"));
        assert!(s.contains("   python: 1 functions\n"));
        assert!(s.contains("   1. add (python): 2 calls\n"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bridge_clear_confirmation_flow() {
        let (mut sh, _, dir) = shell();
        sh.run_command("simulate def add(a, b):");

        let prompt = sh.run_command("bridge-clear");
        assert!(prompt.contains("CONFIRM"));
        assert_eq!(sh.run_command("no"), "operation cancelled\n");
        assert!(sh.context().bridge.has_function("add"));

        sh.run_command("bridge-clear");
        assert_eq!(
            sh.run_command("CONFIRM"),
            "1 functions removed from the bridge\n"
        );
        assert!(sh.context().bridge.is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_backup_restore_commands() {
        let (mut sh, _, dir) = shell();
        sh.run_command("simulate def add(a, b):\nadd(1, 2)");

        let created = sh.run_command("bridge-backup b1");
        assert!(created.starts_with("backup created: "));

        sh.run_command("simulate def mul(a, b):\nadd(1, 2)");
        let listed = sh.run_command("bridge-list-backups");
        assert!(listed.contains("1. b1\n"));

        let restored = sh.run_command("bridge-restore b1");
        assert_eq!(restored, "backup 'b1' restored, 1 functions loaded\n");
        assert!(!sh.context().bridge.has_function("mul"));
        assert_eq!(
            sh.context().bridge.get_function("add").unwrap().call_count,
            1
        );

        let missing = sh.run_command("bridge-restore nope");
        assert_eq!(missing, "bridge-restore: Backup 'nope' not found\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_list_backups_when_none() {
        let (mut sh, _, dir) = shell();
        let s = sh.run_command("bridge-list-backups");
        assert!(s.ends_with("   no backups found\n"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_run_file_simulates_contents() {
        let (mut sh, _, dir) = shell();
        let file = dir.join("script.py");
        fs::write(&file, "def square(n):\ny = 3\nsquare(y)\n").unwrap();

        let s = sh.run_command(&format!("run-file {}", file.display()));

        assert!(s.contains("function 'square' registered (python)"));
        assert_eq!(sh.context().store.get_var("y"), Some("3"));
        assert_eq!(
            sh.context().bridge.get_function("square").unwrap().call_count,
            1
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_remove_save_list_status_help_exit() {
        let (mut sh, handle, dir) = shell();
        sh.run_command("simulate def add(a, b):\nz = 1");

        assert!(
            sh.run_command("bridge-list")
                .contains("add(a, b) [python]: 0 calls, last called never")
        );
        assert_eq!(sh.run_command("status"), "variables: 1\n   z = 1\n");
        assert_eq!(
            sh.run_command("bridge-remove add"),
            "function 'add' removed from the bridge\n"
        );
        assert_eq!(sh.run_command("bridge-save"), "bridge state saved\n");
        assert_eq!(handle.contents().as_deref(), Some("{}"));
        assert!(sh.run_command("help").contains("bridge-list-backups"));

        sh.run_command("exit");
        assert!(sh.context().should_exit);
        let _ = fs::remove_dir_all(&dir);
    }
}
