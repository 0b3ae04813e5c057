//! # Registry
//!
//! Instance bookkeeping per kind: how many instances exist and what they are
//! called. Unnamed instances get `<Kind>-<n>`. The registry is an ordinary
//! value owned by whatever builds the entities (a network), not a global.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreError;

#[derive(Debug, Clone, Default)]
struct Category {
    next_index: usize,
    names: BTreeSet<String>,
}

/// Per-kind instance counts and names.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    categories: BTreeMap<String, Category>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The name the next unnamed instance of `kind` would receive.
    pub fn peek_name(&self, kind: &str) -> String {
        match self.categories.get(kind) {
            Some(cat) => Self::free_name(kind, cat),
            None => format!("{}-0", kind),
        }
    }

    fn free_name(kind: &str, cat: &Category) -> String {
        let mut index = cat.next_index;
        loop {
            let candidate = format!("{}-{}", kind, index);
            if !cat.names.contains(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Register an instance, returning its final name.
    ///
    /// An explicit name must not already be taken within the kind.
    pub fn register(&mut self, kind: &str, name: Option<&str>) -> Result<String, CoreError> {
        let cat = self.categories.entry(kind.to_string()).or_default();
        let name = match name {
            Some(n) => {
                if cat.names.contains(n) {
                    return Err(CoreError::config(
                        kind,
                        format!("an instance named '{}' is already registered", n),
                    ));
                }
                n.to_string()
            }
            None => {
                let n = Self::free_name(kind, cat);
                cat.next_index += 1;
                n
            }
        };
        cat.names.insert(name.clone());
        Ok(name)
    }

    /// Check an explicit name without registering it.
    pub fn check_available(&self, kind: &str, name: &str) -> Result<(), CoreError> {
        match self.categories.get(kind) {
            Some(cat) if cat.names.contains(name) => Err(CoreError::config(
                kind,
                format!("an instance named '{}' is already registered", name),
            )),
            _ => Ok(()),
        }
    }

    /// Number of live instances of `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.categories.get(kind).map_or(0, |c| c.names.len())
    }

    pub fn names(&self, kind: &str) -> Vec<&str> {
        self.categories
            .get(kind)
            .map(|c| c.names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Forget an instance. Returns false if it was not registered.
    ///
    /// Auto indices keep counting while any instance of `kind` is live and
    /// restart at 0 once the kind is empty.
    pub fn remove(&mut self, kind: &str, name: &str) -> bool {
        let Some(cat) = self.categories.get_mut(kind) else {
            return false;
        };
        let removed = cat.names.remove(name);
        if cat.names.is_empty() {
            cat.next_index = 0;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.categories.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_names_are_indexed() {
        let mut reg = Registry::new();
        assert_eq!(reg.peek_name("Mapping"), "Mapping-0");
        assert_eq!(reg.register("Mapping", None).unwrap(), "Mapping-0");
        assert_eq!(reg.register("Mapping", None).unwrap(), "Mapping-1");
        assert_eq!(reg.register("ControlSignal", None).unwrap(), "ControlSignal-0");
        assert_eq!(reg.count("Mapping"), 2);
    }

    #[test]
    fn test_duplicate_explicit_name_rejected() {
        let mut reg = Registry::new();
        reg.register("Mapping", Some("a_to_b")).unwrap();
        assert!(reg.register("Mapping", Some("a_to_b")).is_err());
        assert!(reg.check_available("Mapping", "a_to_b").is_err());
        // same name under another kind is fine
        assert!(reg.register("ControlSignal", Some("a_to_b")).is_ok());
    }

    #[test]
    fn test_auto_name_skips_taken_explicit_name() {
        let mut reg = Registry::new();
        reg.register("Mapping", Some("Mapping-0")).unwrap();
        assert_eq!(reg.peek_name("Mapping"), "Mapping-1");
        assert_eq!(reg.register("Mapping", None).unwrap(), "Mapping-1");
    }

    #[test]
    fn test_remove_and_clear() {
        let mut reg = Registry::new();
        let name = reg.register("Mapping", None).unwrap();
        assert!(reg.remove("Mapping", &name));
        assert!(!reg.remove("Mapping", &name));
        reg.register("Mapping", None).unwrap();
        reg.clear();
        assert_eq!(reg.count("Mapping"), 0);
    }

    #[test]
    fn test_auto_index_restarts_when_kind_empties() {
        let mut reg = Registry::new();
        let first = reg.register("Mapping", None).unwrap();
        let second = reg.register("Mapping", None).unwrap();

        assert!(reg.remove("Mapping", &first));
        // one still live: keep counting
        assert_eq!(reg.peek_name("Mapping"), "Mapping-2");

        assert!(reg.remove("Mapping", &second));
        assert_eq!(reg.peek_name("Mapping"), "Mapping-0");
        assert_eq!(reg.register("Mapping", None).unwrap(), "Mapping-0");
    }
}
