// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # cjswrap-runtime
//!
//! The synchronous module runtime injected once into every wrapped bundle.
//!
//! Each source file of a bundle is wrapped in a registration call that hands
//! the runtime a factory and an id derived from the file path. After all
//! registrations, the bundle requires its entry modules. This crate provides:
//!
//! - A pure id resolver (`./a/b` + `../c` = `./c`)
//! - A registry of factories, evaluated lazily and at most once
//! - An evaluation cache that can write through to a host loader's cache
//! - An optional bridge to a host loader for ids the bundle does not contain
//!
//! ## Quick Start
//!
//! ```rust
//! use cjswrap_runtime::{Factory, Object, Runtime, RuntimeOptions, Value};
//!
//! let runtime = Runtime::new(RuntimeOptions::default());
//!
//! runtime.register("./lib/util.js", Factory::new(|_require, module| {
//!     let exports = Object::new();
//!     exports.set("name", "util");
//!     module.set_exports(exports);
//!     Ok(())
//! }));
//!
//! runtime.register("./index.js", Factory::new(|require, module| {
//!     let util = require.require("./lib/util")?;
//!     module.set_exports(util);
//!     Ok(())
//! }));
//!
//! let exports = runtime.run_main(&["./index"]).unwrap();
//! let name = exports[0].as_object().and_then(|o| o.get("name"));
//! assert_eq!(name, Some(Value::from("util")));
//! ```
//!
//! The runtime is single-threaded: handles are `Rc`-based and every require
//! runs to completion on the caller's stack.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod loader;
pub mod module;
pub mod registry;
pub mod resolver;
pub mod value;

// Re-exports
pub use cache::EvaluationCache;
pub use config::{OneOrMany, RuntimeOptions, WrapOptions};
pub use error::{Result, RuntimeError};
pub use host::{HostCache, HostLoader, SharedCache};
pub use loader::{LocalRequire, Request, Runtime};
pub use module::Module;
pub use registry::{Factory, ModuleRegistry};
pub use resolver::{anchor_key, is_bare, is_relative, normalize_id, resolve};
pub use value::{Array, Function, Object, Value};

/// Version of the runtime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
