// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host loader interop.
//!
//! A bundle may run inside an environment that already has a module loader.
//! When one is bound, the runtime falls back to it for ids it does not know,
//! shares its export cache, forwards `require.resolve` to it, and copies the
//! host's current `module.parent` onto every module record.

use crate::error::{Result, RuntimeError};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Export cache owned by the host loader
pub trait HostCache {
    /// Check if a key is cached
    fn has(&self, key: &str) -> bool;

    /// Get a cached value
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value
    fn set(&self, key: &str, value: Value);
}

/// Module loader provided by the surrounding environment
pub trait HostLoader {
    /// Load a module the bundle does not contain
    fn require(&self, id: &str) -> Result<Value>;

    /// `require.resolve` of the host
    fn resolve(&self, request: &str) -> Result<String> {
        Err(RuntimeError::HostResolve {
            request: request.to_string(),
            reason: "host loader has no resolve".to_string(),
        })
    }

    /// The host's `require.cache`
    fn cache(&self) -> Option<Rc<dyn HostCache>> {
        None
    }

    /// `module.parent` of the host's current module
    fn parent(&self) -> Option<Value> {
        None
    }
}

/// Host cache backed by a shared map. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct SharedCache {
    entries: Rc<RefCell<HashMap<String, Value>>>,
}

impl SharedCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Remove an entry
    pub fn delete(&self, key: &str) -> Option<Value> {
        self.entries.borrow_mut().remove(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl HostCache for SharedCache {
    fn has(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.entries.borrow_mut().insert(key.to_string(), value);
    }
}
