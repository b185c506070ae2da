// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `module` record handed to each factory

use crate::value::Value;
use std::cell::{Cell, RefCell};

/// Per-evaluation module record
#[derive(Debug)]
pub struct Module {
    /// The module's normalized id
    id: String,
    /// The module's exports
    exports: RefCell<Value>,
    /// Host module that required this bundle, if any
    parent: Option<Value>,
    /// Whether the factory has finished running
    loaded: Cell<bool>,
}

impl Module {
    /// Create a record with empty exports
    pub fn new(id: impl Into<String>, parent: Option<Value>) -> Self {
        Self {
            id: id.into(),
            exports: RefCell::new(Value::Undefined),
            parent,
            loaded: Cell::new(false),
        }
    }

    /// The module's id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current value of `module.exports`
    pub fn exports(&self) -> Value {
        self.exports.borrow().clone()
    }

    /// Assign `module.exports`
    pub fn set_exports(&self, value: impl Into<Value>) {
        *self.exports.borrow_mut() = value.into();
    }

    /// `module.parent`, inherited from the host's current module
    pub fn parent(&self) -> Option<&Value> {
        self.parent.as_ref()
    }

    /// Whether the factory has run to completion
    pub fn loaded(&self) -> bool {
        self.loaded.get()
    }

    pub(crate) fn mark_loaded(&self) {
        self.loaded.set(true);
    }
}
