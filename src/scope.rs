//! The worker global scope: a stateless dispatcher from platform events to
//! handlers, with the cache storage as the only persistent resource.
//!
//! Every spawned side effect (the opportunistic cache writes) is recorded
//! in a `PendingTasks` list; `settle()` awaits them all, mirroring the
//! platform guarantee that a worker is not recycled while extended event
//! lifetimes are outstanding.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use url::Url;

use crate::clients::Clients;
use crate::config::SwConfig;
use crate::fetch::{NetworkBackend, Request, Response};
use crate::lifecycle::{ServiceWorkerRegistration, ServiceWorkerState};
use crate::notify::{build_notification, NotificationPresenter, ACTION_CLOSE, ACTION_EXPLORE};
use crate::proxy::OfflineCacheProxy;
use crate::SwError;

/// Message type that forces immediate activation of a waiting worker.
pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// Background sync tag for question data.
pub const SYNC_QUESTIONS_TAG: &str = "sync-questions";

/// A platform event delivered to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// New worker version installing.
    Install,
    /// New worker version taking control.
    Activate,
    /// Intercepted resource fetch.
    Fetch(Request),
    /// Background sync firing.
    Sync { tag: String },
    /// Push message, with its payload text if any.
    Push { payload: Option<String> },
    /// Notification interaction; `action` is the chosen button, `None` for
    /// a click on the notification body.
    NotificationClick { action: Option<String> },
    /// Inter-process control message.
    Message(JsonValue),
}

impl WorkerEvent {
    /// Event kind name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::Sync { .. } => "sync",
            WorkerEvent::Push { .. } => "push",
            WorkerEvent::NotificationClick { .. } => "notificationclick",
            WorkerEvent::Message(_) => "message",
        }
    }
}

/// Events the scope reports back to its host.
#[derive(Debug, Clone)]
pub enum ScopeEvent {
    /// A worker version changed state.
    StateChange {
        version: String,
        state: ServiceWorkerState,
    },
    /// A window was opened from a notification click.
    WindowOpened { url: String },
}

/// Spawned side effects whose completion extends an event's lifetime.
#[derive(Debug, Clone, Default)]
pub struct PendingTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl PendingTasks {
    /// Register a spawned task.
    pub async fn push(&self, handle: JoinHandle<()>) {
        self.handles.lock().await.push(handle);
    }

    /// Await every registered task.
    pub async fn settle(&self) {
        loop {
            let handle = self.handles.lock().await.pop();
            match handle {
                Some(handle) => {
                    let _ = handle.await;
                }
                None => break,
            }
        }
    }
}

/// The worker global.
pub struct WorkerScope {
    config: SwConfig,
    proxy: OfflineCacheProxy,
    clients: Arc<RwLock<Clients>>,
    registration: Arc<RwLock<ServiceWorkerRegistration>>,
    presenter: Arc<dyn NotificationPresenter>,
    pending: PendingTasks,
    event_tx: mpsc::UnboundedSender<ScopeEvent>,
}

impl WorkerScope {
    /// Create a scope over the injected platform seams. Returns the scope
    /// and the receiver for host-facing events.
    pub fn new(
        config: SwConfig,
        network: Arc<dyn NetworkBackend>,
        presenter: Arc<dyn NotificationPresenter>,
    ) -> (Self, mpsc::UnboundedReceiver<ScopeEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let proxy = OfflineCacheProxy::new(config.clone(), network);

        (
            Self {
                config,
                proxy,
                clients: Arc::new(RwLock::new(Clients::new())),
                registration: Arc::new(RwLock::new(ServiceWorkerRegistration::new())),
                presenter,
                pending: PendingTasks::default(),
                event_tx,
            },
            event_rx,
        )
    }

    /// Shared handle to the cache storage.
    pub fn caches(&self) -> Arc<RwLock<crate::cache::CacheStorage>> {
        self.proxy.caches()
    }

    /// Shared handle to the controlled pages.
    pub fn clients(&self) -> Arc<RwLock<Clients>> {
        Arc::clone(&self.clients)
    }

    /// Shared handle to the registration.
    pub fn registration(&self) -> Arc<RwLock<ServiceWorkerRegistration>> {
        Arc::clone(&self.registration)
    }

    /// Dispatch one platform event. Only fetch events produce a response.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<Option<Response>, SwError> {
        trace!(kind = event.kind(), "dispatching event");
        match event {
            WorkerEvent::Install => self.handle_install().await.map(|_| None),
            WorkerEvent::Activate => self.handle_activate().await.map(|_| None),
            WorkerEvent::Fetch(request) => {
                Ok(self.proxy.handle_fetch(&request, &self.pending).await)
            }
            WorkerEvent::Sync { tag } => self.handle_sync(&tag).await.map(|_| None),
            WorkerEvent::Push { payload } => {
                self.handle_push(payload.as_deref()).await.map(|_| None)
            }
            WorkerEvent::NotificationClick { action } => self
                .handle_notification_click(action.as_deref())
                .await
                .map(|_| None),
            WorkerEvent::Message(value) => self.handle_message(&value).await.map(|_| None),
        }
    }

    /// Await all outstanding extended-lifetime tasks.
    pub async fn settle(&self) {
        self.pending.settle().await;
    }

    async fn handle_install(&self) -> Result<(), SwError> {
        {
            let mut registration = self.registration.write().await;
            registration.begin_install(self.config.cache_name.as_str());
        }

        match self.proxy.install().await {
            Ok(()) => {
                let mut registration = self.registration.write().await;
                registration.install_complete();
                self.emit_state(ServiceWorkerState::Installed);
                Ok(())
            }
            Err(e) => {
                let mut registration = self.registration.write().await;
                registration.install_failed();
                self.emit_state(ServiceWorkerState::Redundant);
                Err(e)
            }
        }
    }

    async fn handle_activate(&self) -> Result<(), SwError> {
        self.proxy.activate().await?;

        let mut registration = self.registration.write().await;
        registration.activate();
        self.emit_state(ServiceWorkerState::Activated);
        Ok(())
    }

    async fn handle_sync(&self, tag: &str) -> Result<(), SwError> {
        debug!(tag, "background sync event");
        if tag == SYNC_QUESTIONS_TAG {
            self.sync_questions().await
        } else {
            trace!(tag, "ignoring unrecognized sync tag");
            Ok(())
        }
    }

    /// Replay pending question edits to the backend. The question data
    /// currently syncs through the app itself, so there is nothing to
    /// replay from the worker.
    async fn sync_questions(&self) -> Result<(), SwError> {
        Ok(())
    }

    async fn handle_push(&self, payload: Option<&str>) -> Result<(), SwError> {
        debug!("push message received");
        let notification = build_notification(payload);
        // Held open until display settles.
        self.presenter.show(&notification).await
    }

    async fn handle_notification_click(&self, action: Option<&str>) -> Result<(), SwError> {
        debug!(?action, "notification clicked");
        self.presenter.close().await?;

        match action {
            Some(ACTION_EXPLORE) => {
                let deep_link = self.config.deep_link.clone();
                self.open_window(&deep_link).await
            }
            Some(ACTION_CLOSE) => Ok(()),
            _ => self.open_window("/").await,
        }
    }

    async fn handle_message(&self, value: &JsonValue) -> Result<(), SwError> {
        let kind = value.get("type").and_then(|v| v.as_str());
        if kind == Some(SKIP_WAITING) {
            debug!("skip-waiting message, activating immediately");
            let mut registration = self.registration.write().await;
            registration.skip_waiting();
            self.emit_state(ServiceWorkerState::Activated);
        } else {
            trace!(?kind, "ignoring unrecognized message");
        }
        Ok(())
    }

    async fn open_window(&self, path: &str) -> Result<(), SwError> {
        let base = Url::parse(&self.config.scope_origin)
            .map_err(|e| SwError::InvalidUrl(format!("{}: {e}", self.config.scope_origin)))?;
        let url = base
            .join(path)
            .map_err(|e| SwError::InvalidUrl(format!("{path}: {e}")))?;

        let mut clients = self.clients.write().await;
        let client = clients.open_window(url);
        let _ = self.event_tx.send(ScopeEvent::WindowOpened {
            url: client.url.to_string(),
        });
        Ok(())
    }

    fn emit_state(&self, state: ServiceWorkerState) {
        let _ = self.event_tx.send(ScopeEvent::StateChange {
            version: self.config.cache_name.clone(),
            state,
        });
    }
}
