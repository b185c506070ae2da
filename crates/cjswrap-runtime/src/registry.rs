// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Registered, not yet evaluated module factories

use crate::error::Result;
use crate::loader::LocalRequire;
use crate::module::Module;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type FactoryFn = dyn Fn(&LocalRequire, &Module) -> Result<()>;

/// A module's top-level code, run at most once per runtime
#[derive(Clone)]
pub struct Factory(Rc<FactoryFn>);

impl Factory {
    /// Wrap a closure taking `(require, module)`
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&LocalRequire, &Module) -> Result<()> + 'static,
    {
        Self(Rc::new(body))
    }

    /// Factory whose body is `module.exports = <json>`
    pub fn json(json: serde_json::Value) -> Self {
        Self::new(move |_, module| {
            module.set_exports(Value::from_json(&json));
            Ok(())
        })
    }

    /// Run the factory
    pub fn call(&self, require: &LocalRequire, module: &Module) -> Result<()> {
        (self.0)(require, module)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Factory")
    }
}

/// Mapping from normalized module id to its factory
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Factory>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a factory. A previous factory under the same id is replaced.
    pub fn register(&mut self, id: impl Into<String>, factory: Factory) -> Option<Factory> {
        self.modules.insert(id.into(), factory)
    }

    /// Check if an id has a factory
    pub fn has(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Get a factory by id
    pub fn get(&self, id: &str) -> Option<Factory> {
        self.modules.get(id).cloned()
    }

    /// All registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.modules.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_has() {
        let mut registry = ModuleRegistry::new();
        assert!(!registry.has("./x"));
        assert!(registry.register("./x", Factory::new(|_, _| Ok(()))).is_none());
        assert!(registry.has("./x"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = ModuleRegistry::new();
        let first = Factory::json(serde_json::json!(1));
        let second = Factory::json(serde_json::json!(2));
        registry.register("./x", first.clone());
        let replaced = registry.register("./x", second.clone());
        assert!(replaced.is_some_and(|f| Rc::ptr_eq(&f.0, &first.0)));
        assert!(registry.get("./x").is_some_and(|f| Rc::ptr_eq(&f.0, &second.0)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_sorted() {
        let mut registry = ModuleRegistry::new();
        registry.register("./b", Factory::new(|_, _| Ok(())));
        registry.register("./a", Factory::new(|_, _| Ok(())));
        assert_eq!(registry.ids(), vec!["./a".to_string(), "./b".to_string()]);
    }
}
