// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module id resolution.
//!
//! Ids are plain strings such as `./lib/util`. Resolution never touches the
//! file system: a relative reference is joined onto the directory of the
//! requiring module's id and `.`/`..` segments are folded away.

/// Extensions stripped from module ids when no options say otherwise
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js"];

/// Returns true for ids starting with `.` (`./x`, `../x`).
pub fn is_relative(id: &str) -> bool {
    id.starts_with('.')
}

/// Returns true for ids that are neither relative nor absolute (`lodash`).
pub fn is_bare(id: &str) -> bool {
    !id.starts_with('.') && !id.starts_with('/')
}

/// Resolve `reference` against the id of the requiring module.
///
/// References not starting with `.` are returned untouched. Surplus `..`
/// segments that would climb above the first segment of `base` are dropped.
/// An empty reference yields the directory of `base`.
pub fn resolve(base: &str, reference: &str) -> String {
    if !reference.is_empty() && !is_relative(reference) {
        return reference.to_string();
    }

    let mut segments: Vec<&str> = base.split('/').collect();
    segments.pop();
    if !reference.is_empty() {
        segments.extend(reference.split('/'));
    }

    let mut resolved: Vec<&str> = Vec::with_capacity(segments.len());
    let mut back = 0usize;
    for segment in segments.iter().rev() {
        match *segment {
            "." => {}
            ".." => back += 1,
            _ if back > 0 => back -= 1,
            plain => resolved.push(plain),
        }
    }
    resolved.reverse();

    if segments.first() == Some(&".") {
        resolved.insert(0, ".");
    }

    resolved.join("/")
}

/// Strip one trailing extension from `id`, trying `extensions` in order.
pub fn normalize_id<S: AsRef<str>>(id: &str, extensions: &[S]) -> String {
    for ext in extensions {
        let ext = ext.as_ref();
        if ext.is_empty() {
            continue;
        }
        if let Some(stripped) = id.strip_suffix(ext) {
            return stripped.to_string();
        }
    }
    id.to_string()
}

/// Key under which a bundle writes `id` into a shared host cache.
///
/// Bare ids get an implied `./` so that `a` and `./a` share one key.
pub fn anchor_key(anchor: &str, id: &str) -> String {
    if is_bare(id) {
        format!("{}#./{}", anchor, id)
    } else {
        format!("{}#{}", anchor, id)
    }
}
