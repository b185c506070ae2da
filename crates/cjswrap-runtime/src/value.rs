// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Export values produced by module factories.
//!
//! Arrays, objects and functions are shared handles: cloning a [`Value`]
//! clones the handle, not the contents, so two requires of the same module
//! observe the same object and can be compared by identity.

use crate::error::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A dynamically typed export value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Array handle
    Array(Array),
    /// Object handle
    Object(Object),
    /// Function handle
    Function(Function),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN != NaN falls out of f64 equality
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is nullish (null or undefined).
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// SameValue comparison: like `==` on handles, but `NaN` is the same as `NaN`.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self == other,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // Historical quirk
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Borrow the object handle, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the function handle, if this is a function.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a value tree from JSON. Every array and object gets a fresh handle.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => {
                Value::Array(Array::from_vec(arr.iter().map(Value::from_json).collect()))
            }
            serde_json::Value::Object(map) => {
                let obj = Object::new();
                for (key, value) in map {
                    obj.set(key.clone(), Value::from_json(value));
                }
                Value::Object(obj)
            }
        }
    }

    /// Convert to JSON the way `JSON.stringify` would: functions and
    /// `undefined` become `null` in arrays and are dropped from objects.
    /// A handle that contains itself is written as `null` where it recurs.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_within(&mut Vec::new())
    }

    /// `ancestors` holds the handles currently being serialized.
    fn to_json_within(&self, ancestors: &mut Vec<*const ()>) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            // Integral numbers print without a fraction, as in JS
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => {
                let ptr = arr.as_ptr();
                if ancestors.contains(&ptr) {
                    return serde_json::Value::Null;
                }
                ancestors.push(ptr);
                let items = arr
                    .to_vec()
                    .iter()
                    .map(|value| value.to_json_within(ancestors))
                    .collect();
                ancestors.pop();
                serde_json::Value::Array(items)
            }
            Value::Object(obj) => {
                let ptr = obj.as_ptr();
                if ancestors.contains(&ptr) {
                    return serde_json::Value::Null;
                }
                ancestors.push(ptr);
                let mut map = serde_json::Map::new();
                for (key, value) in obj.entries() {
                    if matches!(value, Value::Undefined | Value::Function(_)) {
                        continue;
                    }
                    map.insert(key, value.to_json_within(ancestors));
                }
                ancestors.pop();
                serde_json::Value::Object(map)
            }
        }
    }
}

/// Join array elements with `,`. An array nested inside itself joins as empty.
fn join_array(arr: &Array, ancestors: &mut Vec<*const ()>) -> String {
    let ptr = arr.as_ptr();
    if ancestors.contains(&ptr) {
        return String::new();
    }
    ancestors.push(ptr);
    let parts: Vec<String> = arr
        .to_vec()
        .iter()
        .map(|value| match value {
            Value::Array(inner) => join_array(inner, ancestors),
            other => other.to_string(),
        })
        .collect();
    ancestors.pop();
    parts.join(",")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(arr) => write!(f, "{}", join_array(arr, &mut Vec::new())),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(func) => match func.name() {
                "" => write!(f, "[Function (anonymous)]"),
                name => write!(f, "[Function: {}]", name),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(arr: Array) -> Self {
        Value::Array(arr)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

/// Shared, mutable property bag
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<HashMap<String, Value>>>);

impl Object {
    /// Create an empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a property
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Write a property, returning the previous value
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Check for an own property
    pub fn has(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Property names, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of all properties, sorted by key
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Check if the object has no properties
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only keys: values may refer back to this object.
        f.debug_struct("Object").field("keys", &self.keys()).finish()
    }
}

/// Shared, growable list of values
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    /// Create an empty array
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing vector
    pub fn from_vec(values: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(values)))
    }

    /// Read an element
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Append an element
    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Check if the array has no elements
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Copy of the current elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array").field("len", &self.len()).finish()
    }
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

struct NativeFunction {
    name: String,
    func: Box<NativeFn>,
}

/// Callable export backed by a Rust closure
#[derive(Clone)]
pub struct Function(Rc<NativeFunction>);

impl Function {
    /// Create a named function
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Self(Rc::new(NativeFunction {
            name: name.into(),
            func: Box::new(func),
        }))
    }

    /// Function name, empty for anonymous functions
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Invoke the function
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0.func)(args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:?})", self.0.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handles_compare_by_identity() {
        let a = Object::new();
        let b = Object::new();
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn test_nan() {
        let nan = Value::Number(f64::NAN);
        assert_ne!(nan, nan.clone());
        assert!(nan.same(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_object_mutation_is_shared() {
        let obj = Object::new();
        let exported = Value::from(obj.clone());
        obj.set("answer", 42);
        assert_eq!(
            exported.as_object().and_then(|o| o.get("answer")),
            Some(Value::Number(42.0))
        );
    }

    #[test]
    fn test_json_conversion() {
        let json = json!({"name": "x", "list": [1, true, null], "nested": {"a": "b"}});
        let value = Value::from_json(&json);
        assert_eq!(value.type_of(), "object");
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_to_json_skips_functions_in_objects() {
        let obj = Object::new();
        obj.set("f", Function::new("f", |_| Ok(Value::Undefined)));
        obj.set("n", 1);
        assert_eq!(Value::from(obj).to_json(), json!({"n": 1}));
    }

    #[test]
    fn test_function_call_and_display() {
        let double = Function::new("double", |args| match args.first() {
            Some(Value::Number(n)) => Ok(Value::Number(n * 2.0)),
            _ => Ok(Value::Undefined),
        });
        assert_eq!(double.call(&[Value::from(21)]).unwrap(), Value::Number(42.0));
        assert_eq!(Value::from(double).to_string(), "[Function: double]");
        let anon = Function::new("", |_| Ok(Value::Null));
        assert_eq!(Value::from(anon).to_string(), "[Function (anonymous)]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::from(Object::new()).to_string(), "[object Object]");
        let arr = Array::from_vec(vec![Value::from(1), Value::from("a")]);
        assert_eq!(Value::from(arr).to_string(), "1,a");
    }

    #[test]
    fn test_to_json_self_reference_becomes_null() {
        let obj = Object::new();
        obj.set("name", "root");
        obj.set("me", obj.clone());
        assert_eq!(
            Value::from(obj.clone()).to_json(),
            json!({"me": null, "name": "root"})
        );
        // Break the cycle so the object is freed
        obj.set("me", Value::Null);
    }

    #[test]
    fn test_to_json_shared_handle_is_not_a_cycle() {
        let shared = Object::new();
        shared.set("n", 1);
        let arr = Array::from_vec(vec![Value::from(shared.clone()), Value::from(shared)]);
        assert_eq!(Value::from(arr).to_json(), json!([{"n": 1}, {"n": 1}]));
    }

    #[test]
    fn test_self_containing_array() {
        let arr = Array::from_vec(vec![Value::from(1)]);
        arr.push(arr.clone());
        arr.push(2);
        let value = Value::from(arr.clone());
        assert_eq!(value.to_string(), "1,,2");
        assert_eq!(value.to_json(), json!([1, null, 2]));
        arr.0.borrow_mut().clear();
    }
}
