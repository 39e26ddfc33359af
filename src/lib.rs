//! # Mistakebook Service Worker
//!
//! Offline caching and push-notification engine for the Mistakebook study
//! app (a "mistake collection" review tool). This crate models the app's
//! service worker as a host-independent library: the browser platform is
//! injected behind traits so the worker logic runs and tests without a
//! real browser.
//!
//! ## Features
//!
//! - **Offline Cache Proxy**: cache-first fetch interception with network
//!   fallback and opportunistic cache population
//! - **Lifecycle**: install (all-or-nothing app-shell precache), activate
//!   (generational sweep of stale cache stores), skip-waiting
//! - **Push**: payload → notification construction and display
//! - **Notification clicks**: deep-link window routing
//! - **Background sync**: `sync-questions` tag handling
//!
//! ## Architecture
//!
//! ```text
//! WorkerScope (dispatch)
//!     │
//!     ├── install / activate ──→ OfflineCacheProxy ──→ CacheStorage
//!     ├── fetch ───────────────→ OfflineCacheProxy ──→ NetworkBackend
//!     ├── push / click ────────→ NotificationPresenter / Clients
//!     └── message ─────────────→ ServiceWorkerRegistration
//!
//! CacheStorage
//!     └── Cache (one per version tag)
//!             └── Request identity → Response
//! ```

use thiserror::Error;

pub mod cache;
pub mod clients;
pub mod config;
pub mod fetch;
pub mod lifecycle;
pub mod notify;
pub mod proxy;
pub mod scope;

pub use cache::{Cache, CacheStorage};
pub use clients::{Client, Clients};
pub use config::SwConfig;
pub use fetch::{Destination, NetworkBackend, Request, Response, ResponseType};
pub use lifecycle::{ServiceWorker, ServiceWorkerRegistration, ServiceWorkerState};
pub use notify::{build_notification, Notification, NotificationAction, NotificationPresenter};
pub use proxy::OfflineCacheProxy;
pub use scope::{PendingTasks, ScopeEvent, WorkerEvent, WorkerScope};

/// Errors that can occur in service worker operations.
#[derive(Error, Debug, Clone)]
pub enum SwError {
    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("State error: {0}")]
    State(String),
}
