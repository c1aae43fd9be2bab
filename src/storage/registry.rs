// src/storage/registry.rs
//! Shared state for a run: output ids and the id -> player name index.
//!
//! Both are handed to many crawl tasks at once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Hands out output ids, starting at 1.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Output id -> player name.
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: Mutex<BTreeMap<u64, String>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: u64, name: &str) {
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = names.insert(id, name.to_string()) {
            tracing::warn!("Id {} was already registered to {}, now {}", id, previous, name);
        }
    }

    pub fn get(&self, id: u64) -> Option<String> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents, ordered by id.
    pub fn snapshot(&self) -> BTreeMap<u64, String> {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
