//! Typed actions produced by the line classifier and stored in function bodies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language tag attached to actions and registered functions.
///
/// Two dialects are understood by the simulator; any other tag is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    /// Declarative dialect, tagged `python`.
    Python,
    /// Imperative dialect, tagged `javascript`.
    JavaScript,
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Other(tag) => tag,
        }
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "python" => Language::Python,
            "javascript" => Language::JavaScript,
            _ => Language::Other(tag),
        }
    }
}

impl From<&str> for Language {
    fn from(tag: &str) -> Self {
        Language::from(tag.to_string())
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        match lang {
            Language::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single source line asks for.
///
/// Serialized adjacently tagged, e.g. `{"type": "call", "details": {"function": "f", "args": []}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum ActionKind {
    /// `def name(a, b):`
    FunctionDefinition { name: String, params: Vec<String> },
    /// `variable = value`, the value kept as raw text.
    Assignment { variable: String, value: String },
    /// `function(arg, ...)`
    Call { function: String, args: Vec<String> },
    /// `return value`
    Return { value: String },
    /// Anything else. Only narrated.
    Unknown { code: String },
}

/// A classified line together with the language hint the classifier gave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(flatten)]
    pub kind: ActionKind,
    pub lang: Language,
}

impl Action {
    pub fn new(kind: ActionKind, lang: Language) -> Self {
        Self { kind, lang }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::FunctionDefinition { name, params } => {
                write!(f, "def {}({}):", name, params.join(", "))
            }
            ActionKind::Assignment { variable, value } => write!(f, "{} = {}", variable, value),
            ActionKind::Call { function, args } => write!(f, "{}({})", function, args.join(", ")),
            ActionKind::Return { value } => write!(f, "return {}", value),
            ActionKind::Unknown { code } => f.write_str(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_language_tags() {
        assert_eq!(Language::from("python"), Language::Python);
        assert_eq!(Language::from("javascript"), Language::JavaScript);
        assert_eq!(Language::from("rust"), Language::Other("rust".to_string()));
        assert_eq!(Language::JavaScript.to_string(), "javascript");
    }

    #[test]
    fn test_action_wire_format() {
        let action = Action::new(
            ActionKind::Call {
                function: "print".to_string(),
                args: vec!["x".to_string()],
            },
            Language::JavaScript,
        );

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "call",
                "details": {"function": "print", "args": ["x"]},
                "lang": "javascript"
            })
        );

        let back: Action = serde_json::from_value(value).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_action_reads_foreign_language_tag() {
        let action: Action = serde_json::from_value(json!({
            "type": "return",
            "details": {"value": "a * b"},
            "lang": "ruby"
        }))
        .unwrap();

        assert_eq!(
            action.kind,
            ActionKind::Return {
                value: "a * b".to_string()
            }
        );
        assert_eq!(action.lang, Language::Other("ruby".to_string()));
    }
}
