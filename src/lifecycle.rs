//! Worker versions and the registration state machine.
//!
//! A registration holds up to three workers: one installing, one installed
//! and waiting, one active. A new version only takes over at activation;
//! `skip_waiting` forces that handover immediately. A failed install marks
//! the new version redundant and leaves the old active worker in control.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Service worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ServiceWorkerState {
    /// Initial state.
    #[default]
    Parsed,
    /// Install event running.
    Installing,
    /// Installed, waiting for activation.
    Installed,
    /// Activate event running.
    Activating,
    /// Active and controlling pages.
    Activated,
    /// Replaced or install failed.
    Redundant,
}

/// One worker version.
#[derive(Debug, Clone)]
pub struct ServiceWorker {
    /// Version tag (matches the cache store tag it installs).
    pub version: String,

    /// Current state.
    pub state: ServiceWorkerState,

    /// Time of last state change.
    pub state_changed_at: Instant,
}

impl ServiceWorker {
    /// Create a new worker in the parsed state.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            state: ServiceWorkerState::Parsed,
            state_changed_at: Instant::now(),
        }
    }

    /// Set state.
    pub fn set_state(&mut self, state: ServiceWorkerState) {
        self.state = state;
        self.state_changed_at = Instant::now();
    }

    /// Check if active.
    pub fn is_active(&self) -> bool {
        self.state == ServiceWorkerState::Activated
    }
}

/// The registration: installing / waiting / active slots.
#[derive(Debug, Default)]
pub struct ServiceWorkerRegistration {
    /// Worker running its install event.
    pub installing: Option<ServiceWorker>,

    /// Installed worker waiting for activation.
    pub waiting: Option<ServiceWorker>,

    /// Active worker.
    pub active: Option<ServiceWorker>,
}

impl ServiceWorkerRegistration {
    /// Create an empty registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin installing a new version.
    pub fn begin_install(&mut self, version: impl Into<String>) {
        let mut worker = ServiceWorker::new(version);
        worker.set_state(ServiceWorkerState::Installing);
        self.installing = Some(worker);
    }

    /// Install succeeded: installing worker moves to the waiting slot.
    pub fn install_complete(&mut self) {
        if let Some(mut worker) = self.installing.take() {
            worker.set_state(ServiceWorkerState::Installed);
            self.waiting = Some(worker);
        }
    }

    /// Install failed: the new version is redundant, the old active worker
    /// stays in control.
    pub fn install_failed(&mut self) {
        if let Some(mut worker) = self.installing.take() {
            worker.set_state(ServiceWorkerState::Redundant);
        }
    }

    /// Promote the waiting worker to active; the previous active worker
    /// becomes redundant.
    pub fn activate(&mut self) {
        if let Some(mut worker) = self.waiting.take() {
            worker.set_state(ServiceWorkerState::Activating);

            if let Some(mut old) = self.active.take() {
                old.set_state(ServiceWorkerState::Redundant);
            }

            worker.set_state(ServiceWorkerState::Activated);
            self.active = Some(worker);
        }
    }

    /// Force the waiting worker active without waiting for controlled
    /// pages to close.
    pub fn skip_waiting(&mut self) {
        self.activate();
    }
}
