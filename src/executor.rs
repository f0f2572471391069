//! Walks classified actions against a [`Context`], narrating each step.

use crate::action::{Action, ActionKind, Language};
use crate::bridge::{CallResult, FunctionSpec};
use crate::context::Context;
use anyhow::Result;
use serde_json::Value;
use std::io::Write;

/// Call targets treated as "write the first argument to output".
pub const PRINT_ALIASES: &[&str] = &["print", "console.log"];

/// Library results are narrated as JSON cut to this many characters.
const RESULT_PREVIEW_CHARS: usize = 100;

/// What executing one action did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Registered { name: String, lang: Language },
    Assigned { variable: String, value: String },
    LibraryResult(Value),
    MissingMethod { library: String, method: String },
    BridgeResult(CallResult),
    BridgeFailed(String),
    Printed(String),
    NotFound(String),
    Returned(String),
    Unrecognized(String),
    /// The action raised an error; the rest of the sequence still ran.
    Failed(String),
}

/// Execute every action in order, each under its own language hint.
///
/// A failing action is narrated and recorded as [`Outcome::Failed`]; it never stops
/// the actions after it.
pub fn execute_all(actions: &[Action], ctx: &mut Context, out: &mut dyn Write) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(actions.len());
    for action in actions {
        let outcome = match execute(action, &action.lang, ctx, out) {
            Ok(outcome) => outcome,
            Err(e) => {
                let _ = writeln!(out, "error executing action '{}': {:#}", action.kind, e);
                Outcome::Failed(e.to_string())
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// Execute a single action as if written in `lang`.
pub fn execute(
    action: &Action,
    lang: &Language,
    ctx: &mut Context,
    out: &mut dyn Write,
) -> Result<Outcome> {
    match &action.kind {
        ActionKind::FunctionDefinition { name, params } => {
            ctx.bridge
                .register_function(name, FunctionSpec::new(lang.clone(), params.clone()))?;
            writeln!(out, "function '{}' registered ({})", name, lang)?;
            Ok(Outcome::Registered {
                name: name.clone(),
                lang: lang.clone(),
            })
        }

        ActionKind::Assignment { variable, value } => {
            writeln!(out, "  assigning: {} = {}", variable, value)?;
            ctx.store.set_var(variable, value);
            Ok(Outcome::Assigned {
                variable: variable.clone(),
                value: value.clone(),
            })
        }

        ActionKind::Call { function, args } => {
            writeln!(out, "  executing: {}({})", function, args.join(", "))?;
            call(function, args, ctx, out)
        }

        ActionKind::Return { value } => {
            writeln!(out, "  returning: {}", value)?;
            Ok(Outcome::Returned(value.clone()))
        }

        ActionKind::Unknown { code } => {
            writeln!(out, "  unknown action: {}", code)?;
            Ok(Outcome::Unrecognized(code.clone()))
        }
    }
}

/// Resolve a call target: loaded library, then bridge, then print, then nothing.
fn call(
    function: &str,
    args: &[String],
    ctx: &mut Context,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let mut segments = function.split('.');
    let prefix = segments.next().unwrap_or_default();

    if let Some(library) = ctx.libraries.get(prefix) {
        let method = segments.next().unwrap_or_default();
        return match library.invoke(method, args) {
            Some(result) => {
                let preview: String = serde_json::to_string(&result)?
                    .chars()
                    .take(RESULT_PREVIEW_CHARS)
                    .collect();
                writeln!(out, "    result: {}", preview)?;
                Ok(Outcome::LibraryResult(result))
            }
            None => {
                writeln!(out, "    method '{}' not found in library '{}'", method, prefix)?;
                Ok(Outcome::MissingMethod {
                    library: prefix.to_string(),
                    method: method.to_string(),
                })
            }
        };
    }

    if ctx.bridge.has_function(function) {
        return match ctx.bridge.call_function(function, args) {
            Ok(result) => {
                for line in &result.trace {
                    writeln!(out, "    -> {}", line)?;
                }
                writeln!(
                    out,
                    "    cross-language result: {}",
                    serde_json::to_string(&result)?
                )?;
                Ok(Outcome::BridgeResult(result))
            }
            Err(e) => {
                writeln!(out, "    bridge error: {}", e)?;
                Ok(Outcome::BridgeFailed(e.to_string()))
            }
        };
    }

    if PRINT_ALIASES.contains(&function) {
        let emitted = args.first().cloned().unwrap_or_default();
        writeln!(out, "    output: {}", emitted)?;
        return Ok(Outcome::Printed(emitted));
    }

    writeln!(out, "    function '{}' not found", function)?;
    Ok(Outcome::NotFound(function.to_string()))
}
