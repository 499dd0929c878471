//! The session-scoped cache contract.

use std::collections::HashMap;

use serde_json::Value;

/// Key/value storage scoped to one administrator session.
///
/// Entries are addressed by `(namespace, field)` and never expire.
pub trait SessionScopedCache {
    /// The stored value, if any.
    fn get(&self, namespace: &str, field: &str) -> Option<Value>;

    /// Store a value, replacing any previous one.
    fn set(&mut self, namespace: &str, field: &str, value: Value);
}

/// Cache living only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionCache {
    entries: HashMap<(String, String), Value>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionScopedCache for MemorySessionCache {
    fn get(&self, namespace: &str, field: &str) -> Option<Value> {
        self.entries
            .get(&(namespace.to_string(), field.to_string()))
            .cloned()
    }

    fn set(&mut self, namespace: &str, field: &str, value: Value) {
        self.entries
            .insert((namespace.to_string(), field.to_string()), value);
    }
}
