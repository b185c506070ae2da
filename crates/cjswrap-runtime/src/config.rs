// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime and wrap options.

use crate::error::{Result, RuntimeError};
use crate::resolver::DEFAULT_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options consumed by the module runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    /// Log unresolved modules and `resolve` failures
    pub debug: bool,

    /// Bundle location used to namespace host cache keys
    pub anchor: Option<String>,

    /// Extensions stripped from module ids
    pub extensions: Vec<String>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            debug: false,
            anchor: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl RuntimeOptions {
    /// Load options from a JSON file, defaulting missing fields.
    pub fn load(path: &Path) -> Result<Self> {
        let mut options = RuntimeOptions::default();
        options.merge_from_file(path)?;
        Ok(options)
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: RuntimeOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Overlay the fields present in a JSON file onto these options.
    pub fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let overlay: serde_json::Value = serde_json::from_str(&content)?;
        let serde_json::Value::Object(fields) = overlay else {
            return Err(RuntimeError::Config(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        };

        let mut merged = serde_json::to_value(&*self)?;
        if let serde_json::Value::Object(base) = &mut merged {
            base.extend(fields);
        }
        let options: RuntimeOptions = serde_json::from_value(merged)?;
        options.validate()?;
        *self = options;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(ext) = self.extensions.iter().find(|ext| !ext.starts_with('.')) {
            return Err(RuntimeError::Config(format!(
                "extension '{}' must start with '.'",
                ext
            )));
        }
        Ok(())
    }
}

/// One entry id or a list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single id
    One(String),
    /// Several ids
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    /// Flatten into a list
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(id) => vec![id.clone()],
            OneOrMany::Many(ids) => ids.clone(),
        }
    }
}

/// The build-time wrapper options that reach the runtime.
///
/// Wrapper-only keys (`type`, `insertAtTop`, `insertAtBottom`) are accepted
/// in the same file and ignored here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WrapOptions {
    /// Entry module ids evaluated once the bundle is loaded
    pub main: OneOrMany,

    /// Bind the surrounding `require`/`module` as the host loader
    pub include_global: bool,

    /// Enable runtime diagnostics
    pub debug: bool,
}

impl WrapOptions {
    /// Load wrap options from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse wrap options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Entry module ids as a list
    pub fn mains(&self) -> Vec<String> {
        self.main.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_runtime_defaults() {
        let options = RuntimeOptions::default();
        assert!(!options.debug);
        assert!(options.anchor.is_none());
        assert_eq!(options.extensions, vec![".js".to_string()]);
    }

    #[test]
    fn test_runtime_from_json_fills_defaults() {
        let options = RuntimeOptions::from_json_str(r#"{"debug": true}"#).unwrap();
        assert!(options.debug);
        assert_eq!(options.extensions, vec![".js".to_string()]);
    }

    #[test]
    fn test_runtime_rejects_bad_extension() {
        let err = RuntimeOptions::from_json_str(r#"{"extensions": ["js"]}"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn test_merge_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"anchor": "/dist/app.js"}}"#).unwrap();

        let mut options = RuntimeOptions {
            debug: true,
            ..RuntimeOptions::default()
        };
        options.merge_from_file(file.path()).unwrap();
        assert!(options.debug);
        assert_eq!(options.anchor.as_deref(), Some("/dist/app.js"));
    }

    #[test]
    fn test_load_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        let err = RuntimeOptions::load(file.path()).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn test_wrap_defaults() {
        let options = WrapOptions::from_json_str("{}").unwrap();
        assert!(options.mains().is_empty());
        assert!(!options.include_global);
        assert!(!options.debug);
    }

    #[test]
    fn test_wrap_options_parse() {
        let options = WrapOptions::from_json_str(
            r#"{"type": "moduleWrap", "main": "./index.js", "includeGlobal": true, "debug": true, "insertAtTop": "/* top */"}"#,
        )
        .unwrap();
        assert_eq!(options.mains(), vec!["./index.js".to_string()]);
        assert!(options.include_global);
        assert!(options.debug);
    }

    #[test]
    fn test_wrap_main_list() {
        let options = WrapOptions::from_json_str(r#"{"main": ["./a", "./b"]}"#).unwrap();
        assert_eq!(options.mains(), vec!["./a".to_string(), "./b".to_string()]);
    }

    #[test]
    fn test_wrap_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"main": "./lib/data.json", "debug": true}}"#).unwrap();
        let options = WrapOptions::load(file.path()).unwrap();
        assert_eq!(options.mains(), vec!["./lib/data.json".to_string()]);
        assert!(options.debug);
    }
}
