// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative record accessors.
//!
//! Chart props name record fields in three ways: a plain field name (`"id"`), a dotted path
//! (`"meta.owner.name"`), or a closure. [`Accessor`] is the declarative form and
//! [`Accessor::resolve`] turns it into a [`Getter`].
//!
//! Lookups never fail: a missing field or path segment yields `None`, which is kept distinct
//! from a present-but-falsy value such as `0`, `false`, `""` or `null`.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use serde_json::Value;

/// A declarative accessor for a field of a JSON record.
#[derive(Clone)]
pub enum Accessor {
    /// Direct property lookup.
    Field(String),
    /// Nested property lookup, one segment per level.
    ///
    /// Numeric segments index into arrays.
    Path(Vec<String>),
    /// A caller-provided function, used as-is.
    Func(Arc<dyn Fn(&Value) -> Option<Value>>),
}

impl core::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Path(segments) => f.debug_tuple("Path").field(segments).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl PartialEq for Accessor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Field(a), Self::Field(b)) => a == b,
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Func(a), Self::Func(b)) => core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl From<&str> for Accessor {
    /// Strings containing a `.` become paths, everything else a field lookup.
    fn from(spec: &str) -> Self {
        if spec.contains('.') {
            Self::path(spec)
        } else {
            Self::field(spec)
        }
    }
}

impl From<String> for Accessor {
    fn from(spec: String) -> Self {
        Self::from(spec.as_str())
    }
}

impl Accessor {
    /// Creates a direct field accessor.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Creates a nested accessor from a dotted path such as `"meta.owner.name"`.
    pub fn path(path: &str) -> Self {
        Self::Path(path.split('.').map(ToString::to_string).collect())
    }

    /// Creates an accessor from a closure.
    pub fn func(f: impl Fn(&Value) -> Option<Value> + 'static) -> Self {
        Self::Func(Arc::new(f))
    }

    /// Reads the accessed value from `datum`.
    pub fn get(&self, datum: &Value) -> Option<Value> {
        match self {
            Self::Field(name) => datum.get(name.as_str()).cloned(),
            Self::Path(segments) => lookup_path(datum, segments).cloned(),
            Self::Func(f) => f(datum),
        }
    }

    /// Resolves this spec into a shareable getter function.
    ///
    /// Function accessors keep their identity: resolving the same `Func` twice yields getters
    /// that compare equal.
    pub fn resolve(&self) -> Getter {
        match self {
            Self::Func(f) => Getter(f.clone()),
            _ => {
                let spec = self.clone();
                Getter(Arc::new(move |datum: &Value| spec.get(datum)))
            }
        }
    }
}

fn lookup_path<'a>(datum: &'a Value, segments: &[String]) -> Option<&'a Value> {
    // A literal key containing dots wins over the nested interpretation.
    if segments.len() > 1
        && let Some(map) = datum.as_object()
        && let Some(v) = map.get(&segments.join("."))
    {
        return Some(v);
    }
    let mut current = datum;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment.as_str())?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// A resolved accessor: a pure `record -> value` function.
#[derive(Clone)]
pub struct Getter(Arc<dyn Fn(&Value) -> Option<Value>>);

impl core::fmt::Debug for Getter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Getter(..)")
    }
}

impl PartialEq for Getter {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl Getter {
    /// Applies the getter to a record.
    pub fn get(&self, datum: &Value) -> Option<Value> {
        (self.0)(datum)
    }
}

/// Renders a JSON value the way chart text shows it.
///
/// Strings are used without quotes, integral numbers without a fractional part, and compound
/// values as compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        other => other.to_string(),
    }
}
