// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named, typed blackboard shared across the graph.

use crate::value::{DataType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A stored variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Current value
    pub value: Value,
    /// Declared type
    pub data_type: DataType,
}

/// Variable store keyed by name, iterated in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    entries: IndexMap<String, Variable>,
}

impl VariableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a variable. Overwriting keeps the key's position.
    pub fn set(&mut self, key: impl Into<String>, value: Value, data_type: DataType) {
        self.entries.insert(key.into(), Variable { value, data_type });
    }

    /// Overwrite the value, keeping an existing declared type or taking
    /// the value's runtime type for a new key
    pub fn assign(&mut self, key: &str, value: Value) {
        match self.entries.get_mut(key) {
            Some(variable) => variable.value = value,
            None => {
                let data_type = value.data_type();
                self.set(key, value, data_type);
            }
        }
    }

    /// Insert at a given position, used to restore a removed variable
    pub fn insert_at(&mut self, index: usize, key: impl Into<String>, variable: Variable) {
        let index = index.min(self.entries.len());
        self.entries.shift_insert(index, key.into(), variable);
    }

    /// Value of a variable
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|v| &v.value)
    }

    /// Declared type of a variable
    pub fn data_type(&self, key: &str) -> Option<&DataType> {
        self.entries.get(key).map(|v| &v.data_type)
    }

    /// Full entry of a variable
    pub fn entry(&self, key: &str) -> Option<&Variable> {
        self.entries.get(key)
    }

    /// Position of a key in insertion order
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    /// Remove a variable, returning its position and contents
    pub fn remove(&mut self, key: &str) -> Option<(usize, Variable)> {
        self.entries
            .shift_remove_full(key)
            .map(|(index, _, variable)| (index, variable))
    }

    /// Whether the key exists
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
