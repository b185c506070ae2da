// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module runtime

use crate::value::Value;
use thiserror::Error;

/// Result type for module runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while registering, resolving or evaluating modules
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Module id is neither registered locally nor known to the host loader
    #[error("Cannot find module with id: {0}")]
    ModuleNotFound(String),

    /// The host loader could not resolve a request
    #[error("Error resolving module '{request}': {reason}")]
    HostResolve {
        /// Request passed to the host resolver
        request: String,
        /// Reason for failure
        reason: String,
    },

    /// A value thrown by module code
    #[error("Uncaught {0}")]
    Thrown(Value),

    /// Invalid runtime or wrap options
    #[error("Invalid options: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

impl RuntimeError {
    /// Create a module not found error
    pub fn module_not_found(id: impl Into<String>) -> Self {
        Self::ModuleNotFound(id.into())
    }

    /// Wrap a value thrown by module code
    pub fn thrown(value: impl Into<Value>) -> Self {
        Self::Thrown(value.into())
    }

    /// Returns true if this is an unresolved-module error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RuntimeError::module_not_found("./lib/a");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Cannot find module with id: ./lib/a");

        let err = RuntimeError::thrown("boom");
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Uncaught boom");

        let err = RuntimeError::HostResolve {
            request: "lodash".into(),
            reason: "not installed".into(),
        };
        assert_eq!(err.to_string(), "Error resolving module 'lodash': not installed");
    }

    #[test]
    fn test_json_error_converts() {
        let err: RuntimeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, RuntimeError::Json(_)));
    }
}
