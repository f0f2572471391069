use std::collections::HashMap;

/// Flat, untyped variable memory used by simulated code.
///
/// Every value is kept as the raw text it was assigned; nothing is evaluated.
/// There is a single namespace that lives as long as the owning context.
#[derive(Debug, Clone, Default)]
pub struct VirtualStore {
    vars: HashMap<String, String>,
}

/// Snapshot of the store, sorted by variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub total_variables: usize,
    pub variables: Vec<(String, String)>,
}

impl VirtualStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the last value assigned to `key`.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn status(&self) -> StoreStatus {
        let mut variables: Vec<(String, String)> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        variables.sort();
        StoreStatus {
            total_variables: variables.len(),
            variables,
        }
    }
}
