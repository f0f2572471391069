use argh::FromArgs;
use spu_shell::{Context, EngineConfig, Interpreter};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Simulated programming shell: narrates what short snippets of code would do.
struct Args {
    #[argh(option)]
    /// directory holding the bridge registry (default ./spu-bridge-storage).
    storage_dir: Option<PathBuf>,

    #[argh(option)]
    /// directory holding bridge backups (default ./spu-backups).
    backup_dir: Option<PathBuf>,

    #[argh(option, short = 'c')]
    /// run this command and exit instead of starting the shell; may be repeated.
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args: Args = argh::from_env();

    let mut config = EngineConfig::default();
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(dir) = args.backup_dir {
        config.backup_root = dir;
    }

    let mut sh = Interpreter::with_context(Context::new(&config));

    if !args.command.is_empty() {
        for cmd in &args.command {
            print!("{}", sh.run_command(cmd));
        }
        return Ok(());
    }

    println!("SPU started. Type commands to simulate programming, 'help' lists them.");
    sh.repl()?;
    Ok(())
}
