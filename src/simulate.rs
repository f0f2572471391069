use crate::command::{CommandFactory, ExecutableCommand};
use crate::context::Context;
use crate::executor::{Outcome, execute_all};
use crate::interpreter::Factory;
use crate::parser;
use anyhow::Result;
use std::io::Write;

/// `simulate <code...>`: classify the payload line by line and execute it.
///
/// Unlike the argh builtins it takes the raw payload, newlines and all.
pub struct Simulate {
    code: String,
}

impl Simulate {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CommandFactory for Factory<Simulate> {
    fn try_create(&self, name: &str, payload: &str) -> Option<Box<dyn ExecutableCommand>> {
        (name == "simulate").then(|| Box::new(Simulate::new(payload)) as Box<dyn ExecutableCommand>)
    }
}

impl ExecutableCommand for Simulate {
    fn execute(self: Box<Self>, out: &mut dyn Write, ctx: &mut Context) -> Result<()> {
        run_simulation(&self.code, out, ctx)?;
        Ok(())
    }
}

/// Shared by `simulate` and `run-file`.
pub(crate) fn run_simulation(
    code: &str,
    out: &mut dyn Write,
    ctx: &mut Context,
) -> Result<Vec<Outcome>> {
    writeln!(out, "simulating code: {}", code.trim())?;
    let actions = parser::parse(code);
    log::debug!("{} actions classified", actions.len());
    Ok(execute_all(&actions, ctx, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::env as stdenv;

    #[test]
    fn test_every_line_is_executed_in_order() {
        let mut ctx = Context::with_store(MemoryStore::new(), stdenv::temp_dir());
        ctx.libraries.load("math");

        let mut out = Vec::new();
        let outcomes =
            run_simulation("math.nothing()\nghost(1)\nx = 1\nprint(x)", &mut out, &mut ctx)
                .unwrap();

        assert_eq!(outcomes.len(), 4);
        assert!(matches!(outcomes[0], Outcome::MissingMethod { .. }));
        assert!(matches!(outcomes[1], Outcome::NotFound(_)));
        assert!(matches!(outcomes[2], Outcome::Assigned { .. }));
        assert!(matches!(outcomes[3], Outcome::Printed(_)));
    }

    #[test]
    fn test_factory_only_matches_simulate() {
        let factory = Factory::<Simulate>::default();
        assert!(factory.try_create("simulate", "x = 1").is_some());
        assert!(factory.try_create("simular", "x = 1").is_none());
    }
}
