//! Store implementation
//!
//! HashMap-based key space. Insertion order is irrelevant.

use std::collections::HashMap;

use super::Entry;

/// Key -> entry map
#[derive(Debug, Default)]
pub struct Store {
    data: HashMap<String, Entry>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Insert or overwrite. Empty keys are ignored.
    pub fn insert(&mut self, key: String, entry: Entry) {
        if key.is_empty() {
            return;
        }
        self.data.insert(key, entry);
    }

    /// Get the entry for a key, expired or not
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.data.get(key)
    }

    /// Remove a key, returning its entry if present
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.data.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries held, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All stored keys, including expired ones not yet evicted
    pub fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    /// Keys whose entries are expired at `now`
    pub fn expired_keys(&self, now: u64) -> Vec<String> {
        self.data
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Approximate heap usage of keys and values in bytes
    pub fn approximate_size(&self) -> usize {
        self.data
            .iter()
            .map(|(key, entry)| key.len() + entry.value.len())
            .sum()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
