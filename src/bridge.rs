//! Cross-language function bridge.
//!
//! The bridge keeps a registry of function descriptors, simulates calls to them and
//! records how often and when each one was called. The whole registry is written to
//! its [`RegistryStore`] after every mutation.

use crate::action::{Action, ActionKind, Language};
use crate::error::{BridgeError, StorageError};
use crate::storage::RegistryStore;
use chrono::{DateTime, Local, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static BINARY_OP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\s*([+*])\s*\w+").expect("binary operator pattern"));

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Stored record of one registered function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    pub lang: Language,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub body_actions: Vec<Action>,
    /// Epoch millis of the last registration or call.
    #[serde(default = "now_millis")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_called: Option<i64>,
    #[serde(default)]
    pub call_count: u64,
}

/// Caller-supplied part of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    pub lang: Language,
    pub params: Vec<String>,
    pub body_actions: Vec<Action>,
}

impl FunctionSpec {
    pub fn new(lang: Language, params: Vec<String>) -> Self {
        Self {
            lang,
            params,
            body_actions: Vec::new(),
        }
    }

    pub fn with_body(mut self, body_actions: Vec<Action>) -> Self {
        self.body_actions = body_actions;
        self
    }
}

/// One row of [`FunctionBridge::list_functions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSummary {
    pub name: String,
    pub lang: Language,
    pub params: String,
    pub call_count: u64,
    /// Local wall-clock time of the last call, or `"never"`.
    pub last_called: String,
}

/// Result of a simulated call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub value: Value,
    pub simulated: bool,
    pub language: Language,
    pub timestamp: DateTime<Utc>,
    pub args_received: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
    /// One line per body action, in execution order.
    #[serde(skip)]
    pub trace: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStats {
    pub total_functions: usize,
    pub by_language: BTreeMap<String, usize>,
    /// Sorted by call count, highest first.
    pub most_called: Vec<FunctionUsage>,
    /// Sorted by last activity, newest first.
    pub recent_functions: Vec<RecentActivity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionUsage {
    pub name: String,
    pub calls: u64,
    pub lang: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentActivity {
    pub name: String,
    pub timestamp: i64,
    pub lang: Language,
}

pub struct FunctionBridge {
    functions: BTreeMap<String, FunctionDescriptor>,
    store: Box<dyn RegistryStore>,
}

impl FunctionBridge {
    /// Create a bridge over `store` and load whatever the store already holds.
    pub fn open(store: impl RegistryStore + 'static) -> Self {
        let mut bridge = Self {
            functions: BTreeMap::new(),
            store: Box::new(store),
        };
        let loaded = bridge.load_from_storage();
        log::info!(
            "bridge: {} functions loaded from {}",
            loaded,
            bridge.store.describe()
        );
        bridge
    }

    /// Insert or fully replace `name`, resetting its statistics, then persist.
    ///
    /// The in-memory registry is updated even when persisting fails.
    pub fn register_function(
        &mut self,
        name: &str,
        spec: FunctionSpec,
    ) -> Result<(), StorageError> {
        let now = now_millis();
        log::info!("bridge: function '{}' registered [{}]", name, spec.lang);
        self.functions.insert(
            name.to_string(),
            FunctionDescriptor {
                lang: spec.lang,
                params: spec.params,
                body_actions: spec.body_actions,
                timestamp: now,
                registered_at: Some(now),
                last_called: None,
                call_count: 0,
            },
        );
        self.save_to_storage()
    }

    /// Remove `name`. Returns `false`, without touching storage, when it isn't registered.
    pub fn unregister_function(&mut self, name: &str) -> Result<bool, StorageError> {
        if self.functions.remove(name).is_none() {
            return Ok(false);
        }
        log::info!("bridge: function '{}' removed", name);
        self.save_to_storage()?;
        Ok(true)
    }

    /// Remove every function and return how many there were.
    pub fn clear_registry(&mut self) -> Result<usize, StorageError> {
        let count = self.functions.len();
        self.functions.clear();
        self.save_to_storage()?;
        log::info!("bridge: {} functions removed", count);
        Ok(count)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get_function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn list_functions(&self) -> Vec<FunctionSummary> {
        self.functions
            .iter()
            .map(|(name, d)| FunctionSummary {
                name: name.clone(),
                lang: d.lang.clone(),
                params: d.params.join(", "),
                call_count: d.call_count,
                last_called: d
                    .last_called
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "never".to_string()),
            })
            .collect()
    }

    /// Record a call to `name` and simulate its body against `args`.
    ///
    /// Statistics are persisted before the simulation runs; a persistence failure is
    /// logged and does not stop the call.
    pub fn call_function(
        &mut self,
        name: &str,
        args: &[String],
    ) -> Result<CallResult, BridgeError> {
        let descriptor = self
            .functions
            .get_mut(name)
            .ok_or_else(|| BridgeError::NotFound(name.to_string()))?;

        let now = now_millis().max(descriptor.timestamp);
        descriptor.call_count += 1;
        descriptor.timestamp = now;
        descriptor.last_called = Some(now);
        let descriptor = descriptor.clone();

        if let Err(e) = self.save_to_storage() {
            log::warn!("bridge: call statistics for '{}' not saved: {}", name, e);
        }

        log::info!(
            "bridge: calling '{}' ({}) with args [{}], {} calls",
            name,
            descriptor.lang,
            args.join(", "),
            descriptor.call_count
        );
        Ok(simulate(&descriptor, args))
    }

    pub fn get_stats(&self) -> BridgeStats {
        let mut by_language = BTreeMap::new();
        let mut most_called = Vec::with_capacity(self.functions.len());
        let mut recent_functions = Vec::with_capacity(self.functions.len());

        for (name, d) in &self.functions {
            *by_language.entry(d.lang.to_string()).or_insert(0) += 1;
            most_called.push(FunctionUsage {
                name: name.clone(),
                calls: d.call_count,
                lang: d.lang.clone(),
            });
            recent_functions.push(RecentActivity {
                name: name.clone(),
                timestamp: d.timestamp,
                lang: d.lang.clone(),
            });
        }

        most_called.sort_by(|a, b| b.calls.cmp(&a.calls));
        recent_functions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        BridgeStats {
            total_functions: self.functions.len(),
            by_language,
            most_called,
            recent_functions,
        }
    }

    /// Serialize the whole registry and overwrite the stored document.
    pub fn save_to_storage(&mut self) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&self.functions)?;
        self.store.write(&bytes)?;
        log::debug!("bridge: {} functions saved", self.functions.len());
        Ok(())
    }

    /// Replace the in-memory registry with the stored document.
    ///
    /// A missing or unreadable document leaves the registry empty. Returns the number
    /// of functions loaded.
    pub fn load_from_storage(&mut self) -> usize {
        let loaded = match self.store.read() {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).map_err(StorageError::from),
            Ok(None) => Ok(BTreeMap::new()),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(functions) => self.functions = functions,
            Err(e) => {
                log::warn!(
                    "bridge: registry at {} could not be loaded, starting empty: {}",
                    self.store.describe(),
                    e
                );
                self.functions.clear();
            }
        }
        self.functions.len()
    }

    pub(crate) fn store(&self) -> &dyn RegistryStore {
        self.store.as_ref()
    }

    pub(crate) fn store_mut(&mut self) -> &mut dyn RegistryStore {
        self.store.as_mut()
    }
}

/// Walk the body actions with a running "last value" and build the call result.
fn simulate(descriptor: &FunctionDescriptor, args: &[String]) -> CallResult {
    let mut last_value: Option<Value> = None;
    let mut trace = Vec::with_capacity(descriptor.body_actions.len());

    for action in &descriptor.body_actions {
        match &action.kind {
            ActionKind::Assignment { variable, value } => {
                trace.push(format!("{} = {}", variable, value));
                if let Some(v) = binary_arithmetic(value, args) {
                    last_value = Some(v);
                }
            }
            ActionKind::Call {
                function,
                args: call_args,
            } => {
                trace.push(format!("{}({})", function, call_args.join(", ")));
                if function.contains("print") || function.contains("console.log") {
                    last_value = Some(Value::String(format!("Output: {}", args.join(", "))));
                }
            }
            ActionKind::Return { value } => match evaluate_return(value, args) {
                Some(v) => {
                    trace.push(format!("return {}", display_value(&v)));
                    last_value = Some(v);
                }
                None => trace.push(format!("return {}", value)),
            },
            other => trace.push(other.to_string()),
        }
    }

    let lang = descriptor.lang.clone();
    let value = last_value
        .unwrap_or_else(|| Value::String(format!("result_{}_{}", lang, now_millis())));
    let shown = display_value(&value);

    let (result_type, representation) = match lang {
        Language::Python => (
            Some("python_result".to_string()),
            Some(format!("{{{}}} → {}", args.join(" + "), shown)),
        ),
        Language::JavaScript => (
            Some("js_result".to_string()),
            Some(format!("function({}) → {}", args.join(", "), shown)),
        ),
        Language::Other(_) => (None, None),
    };

    CallResult {
        value,
        simulated: true,
        language: lang,
        timestamp: Utc::now(),
        args_received: args.to_vec(),
        result_type,
        representation,
        trace,
    }
}

/// `a + b` / `a * b` anywhere in `expr`, applied to the first two call arguments.
fn binary_arithmetic(expr: &str, args: &[String]) -> Option<Value> {
    let caps = BINARY_OP.captures(expr)?;
    let [lhs, rhs, ..] = args else {
        return None;
    };
    let lhs: f64 = lhs.trim().parse().ok()?;
    let rhs: f64 = rhs.trim().parse().ok()?;
    let result = match &caps[1] {
        "+" => lhs + rhs,
        _ => lhs * rhs,
    };
    Number::from_f64(result).map(Value::Number)
}

fn evaluate_return(expr: &str, args: &[String]) -> Option<Value> {
    binary_arithmetic(expr, args)
        .or_else(|| expr.contains("args").then(|| Value::String(args.join(", "))))
}

/// Render a value the way narration shows it: strings unquoted, whole floats without `.0`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        other => other.to_string(),
    }
}
