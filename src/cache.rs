//! Named, versioned cache stores.
//!
//! A `Cache` maps request identity (method + URL) to a stored response;
//! `CacheStorage` holds one store per version tag. Exactly one tag is
//! "current" at a time — the activation sweep in the proxy deletes all
//! others.

use hashbrown::HashMap;

use crate::fetch::{Request, Response};
use crate::SwError;

/// A single cache store.
#[derive(Debug, Default, Clone)]
pub struct Cache {
    /// Store name (version tag).
    pub name: String,

    entries: HashMap<String, Response>,
}

impl Cache {
    /// Create a new empty store.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Store a response under the request's identity. Only basic success
    /// responses are accepted.
    pub fn put(&mut self, request: &Request, response: Response) -> Result<(), SwError> {
        if !response.is_cacheable() {
            return Err(SwError::Cache(format!(
                "refusing to cache non-basic or non-success response for {}",
                request.url
            )));
        }
        self.entries.insert(request.cache_key(), response);
        Ok(())
    }

    /// Look up a request.
    pub fn match_request(&self, request: &Request) -> Option<&Response> {
        self.entries.get(&request.cache_key())
    }

    /// Delete an entry.
    pub fn delete(&mut self, request: &Request) -> bool {
        self.entries.remove(&request.cache_key()).is_some()
    }

    /// All stored request identities.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(|k| k.as_str()).collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All cache stores, by name.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: HashMap<String, Cache>,
}

impl CacheStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store, creating it if absent.
    pub fn open(&mut self, name: &str) -> &mut Cache {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(name))
    }

    /// Insert a fully built store, replacing any store with the same name.
    /// This is how install commits its staged population in one step.
    pub fn insert(&mut self, cache: Cache) {
        self.caches.insert(cache.name.clone(), cache);
    }

    /// Check if a store exists.
    pub fn has(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Get a store by name.
    pub fn get(&self, name: &str) -> Option<&Cache> {
        self.caches.get(name)
    }

    /// Delete a store.
    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    /// All store names.
    pub fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    /// Look up a request across every store.
    pub fn match_request(&self, request: &Request) -> Option<&Response> {
        for cache in self.caches.values() {
            if let Some(response) = cache.match_request(request) {
                return Some(response);
            }
        }
        None
    }
}
