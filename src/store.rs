use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::time::{Duration, Instant};

/// The Store is responsible for managing key-value pairs, with an optional
/// time-to-live per key. Expired keys are evicted lazily: an entry whose
/// deadline has passed stays in the map until the next `get` observes it.
/// The store is designed to be thread-safe, allowing it to be shared and
/// cloned cheaply using reference counting.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<State>>,
}

struct State {
    keys: HashMap<Bytes, Entry>,
}

pub struct Entry {
    pub data: Bytes,
    pub expires_at: Option<Instant>,
}

impl Store {
    pub fn new() -> Store {
        let state = State {
            keys: HashMap::new(),
        };

        Store {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Inserts or overwrites the entry for `key`. Overwriting replaces any
    /// previous TTL: an entry set without `ttl` never expires.
    pub fn set(&self, key: Bytes, data: Bytes, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let entry = Entry { data, expires_at };

        let mut state = self.inner.lock().unwrap();
        state.keys.insert(key, entry);
    }

    /// Returns the value stored under `key`, or `None` if the key is absent or
    /// expired. An expired entry is removed from the map as a side effect.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let mut state = self.inner.lock().unwrap();

        let expired = match state.keys.get(key) {
            Some(Entry {
                expires_at: Some(expires_at),
                ..
            }) => Instant::now() >= *expires_at,
            Some(_) => false,
            None => return None,
        };

        if expired {
            state.keys.remove(key);
            return None;
        }

        state.keys.get(key).map(|entry| entry.data.clone())
    }

    /// Whether `key` physically resides in the map, expired or not.
    pub fn exists(&self, key: &[u8]) -> bool {
        self.inner.lock().unwrap().keys.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.inner.lock().unwrap().keys.len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
