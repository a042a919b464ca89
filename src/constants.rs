//! Shared constant namespace populated during discovery.
//!
//! Implementation modules publish build-relevant constants as prefixed
//! symbols. The table accepts each name once; later contributions must carry
//! an equal value or discovery fails with [`RegistryError::ConstantConflict`].
//! Once a registry is built the table is only reachable through shared
//! references.

use crate::error::{RegistryError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// One constant contributed by an implementation module.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstantEntry {
    pub name: String,
    pub value: Value,
    /// Module (or built-in registration) that first defined the constant.
    pub origin: String,
}

/// Outcome of merging a single constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    /// The name was already present with an equal value.
    Unchanged,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Name-keyed constant table with insert-once-or-match semantics.
pub struct ConstantTable {
    entries: BTreeMap<String, ConstantEntry>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one constant into the table.
    ///
    /// Returns [`RegistryError::ConstantConflict`] naming both origins when the
    /// name is already bound to a different value.
    pub fn merge(
        &mut self,
        name: &str,
        value: Value,
        origin: &str,
    ) -> Result<MergeOutcome> {
        if let Some(existing) = self.entries.get(name) {
            if values_equal(&existing.value, &value) {
                return Ok(MergeOutcome::Unchanged);
            }
            return Err(RegistryError::ConstantConflict {
                name: name.to_string(),
                existing: existing.value.clone(),
                existing_origin: existing.origin.clone(),
                value,
                origin: origin.to_string(),
            });
        }

        debug!(constant = name, %value, origin, "adding toolchain constant");
        self.entries.insert(
            name.to_string(),
            ConstantEntry {
                name: name.to_string(),
                value,
                origin: origin.to_string(),
            },
        );
        Ok(MergeOutcome::Inserted)
    }

    /// Merge every symbol carrying `prefix`, stripping the prefix first.
    ///
    /// Symbols without the prefix, and a bare prefix with nothing after it,
    /// are ignored. Returns how many new entries were inserted.
    pub fn harvest<'a, I>(&mut self, symbols: I, prefix: &str, origin: &str) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut inserted = 0;
        for (symbol, value) in symbols {
            let Some(name) = symbol.strip_prefix(prefix) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            if self.merge(name, value.clone(), origin)? == MergeOutcome::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn entry(&self, name: &str) -> Option<&ConstantEntry> {
        self.entries.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ConstantEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain `name -> value` view for reporting.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, entry)| (name.clone(), entry.value.clone()))
                .collect(),
        )
    }
}

/// Structural equality that compares numbers by value, so `2` and `2.0`
/// denote the same constant.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}
