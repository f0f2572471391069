//! Line-oriented classifier turning free text into [`Action`]s.
//!
//! There is no grammar here. Each trimmed, non-blank line is looked at on its own and
//! matched against a fixed list of shapes; the first shape that fits decides the action.

use crate::action::{Action, ActionKind, Language};
use regex::Regex;
use std::sync::LazyLock;

static DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^def\s+(\w+)\((.*?)\):").expect("definition pattern"));

static RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^return(?:\s+(.*))?$").expect("return pattern"));

static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_][\w.]*)\((.*?)\)").expect("call pattern"));

/// Classify every non-blank line of `source`.
///
/// Never fails: lines matching no known shape become [`ActionKind::Unknown`].
/// The returned actions are in source line order, one per non-blank line.
pub fn parse(source: &str) -> Vec<Action> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(classify_line)
        .collect()
}

/// Classify a single, already trimmed line.
///
/// Precedence: definition, return, assignment, call, unknown. A line like
/// `y = f(1)` is therefore an assignment, not a call.
pub fn classify_line(line: &str) -> Action {
    if let Some(caps) = DEFINITION.captures(line) {
        let params = split_list(&caps[2])
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        return Action::new(
            ActionKind::FunctionDefinition {
                name: caps[1].to_string(),
                params,
            },
            Language::Python,
        );
    }

    if let Some(caps) = RETURN.captures(line) {
        let value = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        return Action::new(ActionKind::Return { value }, Language::Python);
    }

    if let Some((variable, value)) = line.split_once('=') {
        return Action::new(
            ActionKind::Assignment {
                variable: variable.trim().to_string(),
                value: value.trim().to_string(),
            },
            Language::Python,
        );
    }

    if let Some(caps) = CALL.captures(line) {
        return Action::new(
            ActionKind::Call {
                function: caps[1].to_string(),
                args: split_list(&caps[2]),
            },
            Language::JavaScript,
        );
    }

    Action::new(
        ActionKind::Unknown {
            code: line.to_string(),
        },
        Language::JavaScript,
    )
}

/// Comma-split and trim. An empty list yields a single empty string.
fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(variable: &str, value: &str) -> ActionKind {
        ActionKind::Assignment {
            variable: variable.to_string(),
            value: value.to_string(),
        }
    }

    fn call(function: &str, args: &[&str]) -> ActionKind {
        ActionKind::Call {
            function: function.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn kinds(source: &str) -> Vec<ActionKind> {
        parse(source).into_iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_assignment_then_print() {
        let actions = parse("x = 5\nprint(x)");

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, assignment("x", "5"));
        assert_eq!(actions[0].lang, Language::Python);
        assert_eq!(actions[1].kind, call("print", &["x"]));
        assert_eq!(actions[1].lang, Language::JavaScript);
    }

    #[test]
    fn test_one_action_per_non_blank_line_in_order() {
        let source = "\n  def add(a, b):\n\n  return a + b\n   \nadd(1, 2)\n???\n";
        let actions = kinds(source);

        assert_eq!(actions.len(), 4);
        assert!(matches!(actions[0], ActionKind::FunctionDefinition { .. }));
        assert!(matches!(actions[1], ActionKind::Return { .. }));
        assert!(matches!(actions[2], ActionKind::Call { .. }));
        assert!(matches!(actions[3], ActionKind::Unknown { .. }));
    }

    #[test]
    fn test_definition_params_are_trimmed() {
        assert_eq!(
            kinds("def add( a ,b ):"),
            vec![ActionKind::FunctionDefinition {
                name: "add".to_string(),
                params: vec!["a".to_string(), "b".to_string()],
            }]
        );
        assert_eq!(
            kinds("def noop():"),
            vec![ActionKind::FunctionDefinition {
                name: "noop".to_string(),
                params: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_malformed_definition_falls_through() {
        // no colon, so it is not a definition shape; it still contains a call
        assert_eq!(kinds("def broken(a)"), vec![call("broken", &["a"])]);
    }

    #[test]
    fn test_return_keyword() {
        assert_eq!(
            kinds("return a * b"),
            vec![ActionKind::Return {
                value: "a * b".to_string()
            }]
        );
        assert_eq!(
            kinds("return"),
            vec![ActionKind::Return {
                value: String::new()
            }]
        );
        // not the keyword
        assert_eq!(kinds("returned = 1"), vec![assignment("returned", "1")]);
    }

    #[test]
    fn test_assignment_splits_at_first_equal_sign() {
        assert_eq!(kinds("a = b = c"), vec![assignment("a", "b = c")]);
        assert_eq!(kinds("x == y"), vec![assignment("x", "= y")]);
    }

    #[test]
    fn test_assignment_wins_over_call() {
        assert_eq!(kinds("y = add(1, 2)"), vec![assignment("y", "add(1, 2)")]);
    }

    #[test]
    fn test_call_with_dotted_name_and_empty_args() {
        assert_eq!(
            kinds("math.exampleMethod(1, 2)"),
            vec![call("math.exampleMethod", &["1", "2"])]
        );
        assert_eq!(kinds("console.log()"), vec![call("console.log", &[""])]);
    }

    #[test]
    fn test_unknown_keeps_raw_line() {
        assert_eq!(
            kinds("  for i in range"),
            vec![ActionKind::Unknown {
                code: "for i in range".to_string()
            }]
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let line = "result = compute(1, 2)";
        assert_eq!(classify_line(line), classify_line(line));
    }
}
