// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - registers factories and evaluates them on demand

use crate::cache::EvaluationCache;
use crate::config::{RuntimeOptions, WrapOptions};
use crate::error::{Result, RuntimeError};
use crate::host::HostLoader;
use crate::module::Module;
use crate::registry::{Factory, ModuleRegistry};
use crate::resolver::{self, normalize_id};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, trace, warn};

/// A call into the loader: either a registration or an evaluation
#[derive(Debug, Clone)]
pub enum Request {
    /// `require(factory, id)` as emitted around each wrapped file
    Register {
        /// The module's top-level code
        factory: Factory,
        /// Id derived from the file path
        id: String,
    },
    /// `require(id)`
    Evaluate(String),
}

impl Request {
    /// Build a registration request
    pub fn register(factory: Factory, id: impl Into<String>) -> Self {
        Request::Register {
            factory,
            id: id.into(),
        }
    }
}

impl From<&str> for Request {
    fn from(id: &str) -> Self {
        Request::Evaluate(id.to_string())
    }
}

impl From<String> for Request {
    fn from(id: String) -> Self {
        Request::Evaluate(id)
    }
}

struct RuntimeInner {
    options: RuntimeOptions,
    registry: RefCell<ModuleRegistry>,
    cache: EvaluationCache,
    /// Modules whose factory is currently on the stack
    evaluating: RefCell<HashMap<String, Rc<Module>>>,
    host: Option<Rc<dyn HostLoader>>,
}

/// One module runtime per bundle. Clones share the same registry and cache.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create a self-contained runtime
    pub fn new(options: RuntimeOptions) -> Self {
        Self::build(options, None)
    }

    /// Create a runtime bound to a host loader
    pub fn with_host(options: RuntimeOptions, host: Rc<dyn HostLoader>) -> Self {
        Self::build(options, Some(host))
    }

    /// Create a runtime the way a wrapped bundle sets itself up.
    ///
    /// `wrap.debug` switches diagnostics on. The host loader is bound only
    /// when `wrap.include_global` is set.
    pub fn from_wrap_options(
        wrap: &WrapOptions,
        mut options: RuntimeOptions,
        host: Option<Rc<dyn HostLoader>>,
    ) -> Self {
        options.debug |= wrap.debug;
        let host = match host {
            Some(host) if wrap.include_global => Some(host),
            Some(_) => {
                debug!("includeGlobal is off, host loader not bound");
                None
            }
            None => None,
        };
        Self::build(options, host)
    }

    fn build(options: RuntimeOptions, host: Option<Rc<dyn HostLoader>>) -> Self {
        let cache = match host.as_ref().and_then(|host| host.cache()) {
            Some(host_cache) => EvaluationCache::with_host(host_cache, options.anchor.clone()),
            None => EvaluationCache::new(),
        };
        Self {
            inner: Rc::new(RuntimeInner {
                options,
                registry: RefCell::new(ModuleRegistry::new()),
                cache,
                evaluating: RefCell::new(HashMap::new()),
                host,
            }),
        }
    }

    /// Options this runtime was created with
    pub fn options(&self) -> &RuntimeOptions {
        &self.inner.options
    }

    /// Whether a host loader is bound
    pub fn has_host(&self) -> bool {
        self.inner.host.is_some()
    }

    /// Strip configured extensions from an id
    pub fn normalize(&self, id: &str) -> String {
        normalize_id(id, &self.inner.options.extensions)
    }

    /// The overloaded entry point: register a factory or evaluate a module.
    ///
    /// Registrations yield `None`, evaluations the module's exports.
    pub fn dispatch(&self, request: Request) -> Result<Option<Value>> {
        match request {
            Request::Register { factory, id } => {
                self.register(&id, factory);
                Ok(None)
            }
            Request::Evaluate(id) => self.require(&id).map(Some),
        }
    }

    /// Register a factory under `id`, replacing any previous one.
    pub fn register(&self, id: &str, factory: Factory) {
        let id = self.normalize(id);
        trace!("Registering module {}", id);
        if self.inner.registry.borrow_mut().register(id.clone(), factory).is_some() {
            debug!("Module {} re-registered, previous factory replaced", id);
        }
    }

    /// Evaluate a module (once) and return its exports.
    pub fn require(&self, id: &str) -> Result<Value> {
        let id = self.normalize(id);

        let factory = self.inner.registry.borrow().get(&id);
        let Some(factory) = factory else {
            return self.require_from_host(&id);
        };

        if let Some(exports) = self.inner.cache.get(&id) {
            trace!("Cache hit for {}", id);
            return Ok(exports);
        }

        // Re-entrant require: hand out the exports as they stand
        let partial = self.inner.evaluating.borrow().get(&id).cloned();
        if let Some(module) = partial {
            debug!("Circular require of {}, returning partial exports", id);
            return Ok(module.exports());
        }

        self.evaluate(id, factory)
    }

    fn evaluate(&self, id: String, factory: Factory) -> Result<Value> {
        debug!("Evaluating module {}", id);
        let parent = self.inner.host.as_ref().and_then(|host| host.parent());
        let module = Rc::new(Module::new(id.clone(), parent));
        self.inner
            .evaluating
            .borrow_mut()
            .insert(id.clone(), Rc::clone(&module));

        let local = self.local_require(&id);
        let result = factory.call(&local, &module);
        self.inner.evaluating.borrow_mut().remove(&id);
        result?;

        module.mark_loaded();
        let exports = module.exports();
        self.inner.cache.set(&id, exports.clone());
        Ok(exports)
    }

    fn require_from_host(&self, id: &str) -> Result<Value> {
        let Some(host) = &self.inner.host else {
            let err = RuntimeError::module_not_found(id);
            if self.inner.options.debug {
                error!("{}", err);
            }
            return Err(err);
        };

        trace!("Module {} not in bundle, delegating to host", id);
        match host.require(id) {
            Ok(exports) => Ok(exports),
            Err(err) if err.is_not_found() => {
                if self.inner.options.debug {
                    error!("Host loader: {}", err);
                }
                Err(RuntimeError::module_not_found(id))
            }
            Err(err) => {
                if self.inner.options.debug {
                    error!("Host loader failed for {}: {}", id, err);
                }
                Err(err)
            }
        }
    }

    /// Evaluate each entry module in order, as a bundle's trailing calls do.
    pub fn run_main<S: AsRef<str>>(&self, mains: &[S]) -> Result<Vec<Value>> {
        mains.iter().map(|id| self.require(id.as_ref())).collect()
    }

    /// `require` scoped to the module with the given id
    pub fn local_require(&self, id: &str) -> LocalRequire {
        LocalRequire {
            runtime: self.clone(),
            id: id.to_string(),
        }
    }

    /// Check if a factory is registered under `id`
    pub fn is_registered(&self, id: &str) -> bool {
        self.inner.registry.borrow().has(&self.normalize(id))
    }

    /// Check if exports for `id` are cached
    pub fn is_evaluated(&self, id: &str) -> bool {
        self.inner.cache.has(&self.normalize(id))
    }

    /// Registered module ids, sorted
    pub fn module_ids(&self) -> Vec<String> {
        self.inner.registry.borrow().ids()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeOptions::default())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("options", &self.inner.options)
            .field("registry", &self.inner.registry)
            .field("cache", &self.inner.cache)
            .field("host", &self.inner.host.is_some())
            .finish()
    }
}

/// The `require` a factory receives, bound to its module's id
#[derive(Debug, Clone)]
pub struct LocalRequire {
    runtime: Runtime,
    id: String,
}

impl LocalRequire {
    /// Id of the module this require belongs to
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The owning runtime
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Require `reference`, resolved against this module's id
    pub fn require(&self, reference: &str) -> Result<Value> {
        self.runtime.require(&resolver::resolve(&self.id, reference))
    }

    /// `require.resolve`, forwarded to the host loader.
    ///
    /// Returns `None` without a host or when the host cannot resolve.
    pub fn resolve(&self, request: &str) -> Option<String> {
        let debug = self.runtime.options().debug;
        let Some(host) = &self.runtime.inner.host else {
            if debug {
                warn!("require.resolve unavailable: no host loader bound");
            }
            return None;
        };
        match host.resolve(request) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                if debug {
                    warn!("{}", err);
                }
                None
            }
        }
    }
}
