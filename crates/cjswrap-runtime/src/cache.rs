// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Evaluation cache for require()
//!
//! Lookups consult the host cache first (anchor-qualified key, then the plain
//! id) and fall back to the bundle-private map. Writes go to the host cache
//! under the anchor-qualified key when a host cache is bound, and to the
//! private map otherwise. No borrow of the private map is held while host
//! cache methods run, so a host cache may call back into the runtime.

use crate::host::HostCache;
use crate::resolver::anchor_key;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Exports of modules that finished evaluating
#[derive(Default)]
pub struct EvaluationCache {
    /// Bundle-private exports keyed by plain id
    local: RefCell<HashMap<String, Value>>,
    /// Cache shared with the host loader
    host: Option<Rc<dyn HostCache>>,
    /// Bundle location used to namespace host cache keys
    anchor: Option<String>,
}

impl EvaluationCache {
    /// Create a purely local cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that writes through to a host cache
    pub fn with_host(host: Rc<dyn HostCache>, anchor: Option<String>) -> Self {
        Self {
            local: RefCell::new(HashMap::new()),
            host: Some(host),
            anchor,
        }
    }

    /// Whether a host cache is bound
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Key used in the host cache for `id`
    pub fn host_key(&self, id: &str) -> String {
        match &self.anchor {
            Some(anchor) => anchor_key(anchor, id),
            None => id.to_string(),
        }
    }

    /// Get cached exports
    pub fn get(&self, id: &str) -> Option<Value> {
        if let Some(host) = &self.host {
            if self.anchor.is_some() {
                let key = self.host_key(id);
                if host.has(&key) {
                    return host.get(&key);
                }
            }
            if host.has(id) {
                return host.get(id);
            }
        }
        self.local.borrow().get(id).cloned()
    }

    /// Check if exports are cached
    pub fn has(&self, id: &str) -> bool {
        if let Some(host) = &self.host {
            if self.anchor.is_some() && host.has(&self.host_key(id)) {
                return true;
            }
            if host.has(id) {
                return true;
            }
        }
        self.local.borrow().contains_key(id)
    }

    /// Store exports
    pub fn set(&self, id: &str, value: Value) {
        match &self.host {
            Some(host) => host.set(&self.host_key(id), value),
            None => {
                self.local.borrow_mut().insert(id.to_string(), value);
            }
        }
    }

    /// Number of bundle-private entries
    pub fn local_len(&self) -> usize {
        self.local.borrow().len()
    }
}

impl fmt::Debug for EvaluationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationCache")
            .field("local", &self.local.borrow().keys().collect::<Vec<_>>())
            .field("host", &self.host.is_some())
            .field("anchor", &self.anchor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SharedCache;

    const ANCHOR: &str = "/dist/bundle.js";

    #[test]
    fn test_local_only() {
        let cache = EvaluationCache::new();
        assert!(!cache.has("./x"));
        cache.set("./x", Value::from("x"));
        assert!(cache.has("./x"));
        assert_eq!(cache.get("./x"), Some(Value::from("x")));
        assert_eq!(cache.local_len(), 1);
    }

    #[test]
    fn test_write_through_uses_anchor_key() {
        let host = SharedCache::new();
        let cache = EvaluationCache::with_host(Rc::new(host.clone()), Some(ANCHOR.into()));
        cache.set("./x", Value::from(1));
        assert!(host.has("/dist/bundle.js#./x"));
        assert!(!host.has("./x"));
        assert_eq!(cache.local_len(), 0);
        assert!(cache.has("./x"));
        assert_eq!(cache.get("./x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_anchor_key_wins_over_plain_key() {
        let host = SharedCache::new();
        host.set("./x", Value::from("plain"));
        host.set("/dist/bundle.js#./x", Value::from("anchored"));
        let cache = EvaluationCache::with_host(Rc::new(host), Some(ANCHOR.into()));
        assert_eq!(cache.get("./x"), Some(Value::from("anchored")));
    }

    #[test]
    fn test_plain_host_key_is_visible() {
        let host = SharedCache::new();
        host.set("lodash", Value::from("host copy"));
        let cache = EvaluationCache::with_host(Rc::new(host), Some(ANCHOR.into()));
        assert!(cache.has("lodash"));
        assert_eq!(cache.get("lodash"), Some(Value::from("host copy")));
    }

    #[test]
    fn test_other_anchor_is_not_visible() {
        let host = SharedCache::new();
        host.set("/dist/other.js#./x", Value::from("other bundle"));
        let cache = EvaluationCache::with_host(Rc::new(host), Some(ANCHOR.into()));
        assert!(!cache.has("./x"));
        assert_eq!(cache.get("./x"), None);
    }

    #[test]
    fn test_host_without_anchor_uses_plain_key() {
        let host = SharedCache::new();
        let cache = EvaluationCache::with_host(Rc::new(host.clone()), None);
        cache.set("./x", Value::Null);
        assert!(host.has("./x"));
        assert!(cache.has("./x"));
    }
}
