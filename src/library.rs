use serde_json::{Value, json};
use std::collections::BTreeMap;

/// A simulated library method. Receives the library name and the raw call arguments.
pub type Capability = fn(library: &str, args: &[String]) -> Value;

/// A loaded library and the methods it exposes.
#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    methods: BTreeMap<&'static str, Capability>,
}

impl Library {
    /// Every freshly loaded library exposes the same example capability.
    fn with_default_methods(name: &str) -> Self {
        let mut methods: BTreeMap<&'static str, Capability> = BTreeMap::new();
        methods.insert("exampleMethod", example_method);
        Self {
            name: name.to_string(),
            methods,
        }
    }

    /// Invoke `method` with raw arguments. Returns `None` if the method doesn't exist.
    pub fn invoke(&self, method: &str, args: &[String]) -> Option<Value> {
        self.methods.get(method).map(|f| f(&self.name, args))
    }
}

fn example_method(library: &str, args: &[String]) -> Value {
    json!({
        "result": format!(
            "Executed {}.exampleMethod with arguments: {}",
            library,
            args.join(", ")
        )
    })
}

/// Libraries loaded during the session, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct LibraryRegistry {
    libraries: BTreeMap<String, Library>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a library by name.
    ///
    /// Returns `true` when the library was loaded now and `false` when it was already present.
    pub fn load(&mut self, name: &str) -> bool {
        if self.is_loaded(name) {
            log::debug!("library '{}' is already loaded", name);
            return false;
        }
        self.libraries
            .insert(name.to_string(), Library::with_default_methods(name));
        log::info!("library '{}' loaded", name);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Library> {
        self.libraries.get(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_is_idempotent() {
        let mut libs = LibraryRegistry::new();
        assert!(libs.load("math"));
        assert!(!libs.load("math"));
        assert!(libs.is_loaded("math"));
        assert!(!libs.is_loaded("io"));
        assert_eq!(libs.loaded().collect::<Vec<_>>(), vec!["math"]);
    }

    #[test]
    fn test_example_method_describes_call() {
        let mut libs = LibraryRegistry::new();
        libs.load("math");

        let lib = libs.get("math").unwrap();
        let result = lib
            .invoke("exampleMethod", &["1".to_string(), "2".to_string()])
            .unwrap();

        assert_eq!(
            result,
            json!({"result": "Executed math.exampleMethod with arguments: 1, 2"})
        );
    }

    #[test]
    fn test_missing_method_returns_none() {
        let mut libs = LibraryRegistry::new();
        libs.load("math");
        let lib = libs.get("math").unwrap();
        assert_eq!(lib.invoke("sqrt", &[]), None);
    }
}
