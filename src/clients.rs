//! Controlled pages and window opening.

use hashbrown::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// A controlled page.
#[derive(Debug, Clone)]
pub struct Client {
    /// Client ID.
    pub id: String,

    /// Client URL.
    pub url: Url,

    /// Whether focused.
    pub focused: bool,
}

/// The set of pages controlled by the worker.
#[derive(Debug, Default)]
pub struct Clients {
    clients: HashMap<String, Client>,
}

impl Clients {
    /// Create an empty client set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a client by ID.
    pub fn get(&self, id: &str) -> Option<&Client> {
        self.clients.get(id)
    }

    /// Open a new focused window at the given URL.
    pub fn open_window(&mut self, url: Url) -> Client {
        let client = Client {
            id: next_client_id(),
            url,
            focused: true,
        };
        self.clients.insert(client.id.clone(), client.clone());
        client
    }

    /// Focus an existing client.
    pub fn focus(&mut self, id: &str) -> bool {
        match self.clients.get_mut(id) {
            Some(client) => {
                client.focused = true;
                true
            }
            None => false,
        }
    }

    /// Number of controlled pages.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if no pages are controlled.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

fn next_client_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("client-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}
