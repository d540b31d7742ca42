//! Lazy, single-flight backend construction.
//!
//! Each backend kind has a slot with an explicit state machine:
//!
//! ```text
//! Uninitialized --get--> Initializing --ok--> Ready(handle)
//!       ^                     |
//!       |                     +--err--> Failed(reason) --get--> Initializing
//!       +------shutdown-------+
//! ```
//!
//! The constructor runs outside the lock. Callers arriving while a slot is
//! initializing wait on the slot's condvar and share the outcome.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

use super::{
    BackendError, BackendFactory, BackendHandle, BackendKind, SentimentBackend, SummaryBackend,
};

/// Observable state of a backend slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

enum SlotState {
    Uninitialized,
    Initializing,
    Ready(BackendHandle),
    Failed(String),
}

struct Slot {
    state: Mutex<SlotState>,
    changed: Condvar,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Uninitialized),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, SlotState>) -> MutexGuard<'a, SlotState> {
        self.changed.wait(guard).unwrap_or_else(|e| e.into_inner())
    }
}

/// Moves a slot to `Failed` if construction unwinds, so waiters wake up.
struct InitGuard<'a> {
    slot: &'a Slot,
    armed: bool,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.slot.lock() = SlotState::Failed("backend constructor panicked".to_string());
            self.slot.changed.notify_all();
        }
    }
}

/// Owns the sentiment and summary backends.
pub struct BackendManager {
    factory: Arc<dyn BackendFactory>,
    sentiment: Slot,
    summary: Slot,
}

impl BackendManager {
    pub fn new(factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            factory,
            sentiment: Slot::new(),
            summary: Slot::new(),
        }
    }

    fn slot(&self, kind: BackendKind) -> &Slot {
        match kind {
            BackendKind::Sentiment => &self.sentiment,
            BackendKind::Summary => &self.summary,
        }
    }

    /// Get the backend for `kind`, constructing it on first use.
    ///
    /// Exactly one caller runs the constructor; concurrent callers block
    /// until it finishes and receive the same handle or the same
    /// `ConstructionFailed`. A later call after a failure retries.
    pub fn get(&self, kind: BackendKind) -> Result<BackendHandle, BackendError> {
        let slot = self.slot(kind);
        let mut state = slot.lock();
        let mut waited = false;
        loop {
            match &*state {
                SlotState::Ready(handle) => return Ok(handle.clone()),
                SlotState::Failed(reason) if waited => {
                    return Err(BackendError::ConstructionFailed {
                        kind,
                        reason: reason.clone(),
                    });
                }
                SlotState::Initializing => {}
                SlotState::Uninitialized | SlotState::Failed(_) => break,
            }
            waited = true;
            state = slot.wait(state);
        }

        *state = SlotState::Initializing;
        drop(state);

        let mut guard = InitGuard { slot, armed: true };
        tracing::info!("Initializing {} backend", kind);
        let started = Instant::now();
        let built = self.factory.build(kind).and_then(|handle| {
            if handle.kind() == kind {
                Ok(handle)
            } else {
                Err(BackendError::ConstructionFailed {
                    kind,
                    reason: format!("factory returned a {} backend", handle.kind()),
                })
            }
        });
        guard.armed = false;

        let mut state = slot.lock();
        let result = match built {
            Ok(handle) => {
                tracing::info!(
                    "{} backend '{}' ready in {:.2?}",
                    kind,
                    handle.backend_id(),
                    started.elapsed()
                );
                *state = SlotState::Ready(handle.clone());
                Ok(handle)
            }
            Err(e) => {
                let reason = match e {
                    BackendError::ConstructionFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::warn!("{} backend construction failed: {}", kind, reason);
                *state = SlotState::Failed(reason.clone());
                Err(BackendError::ConstructionFailed { kind, reason })
            }
        };
        drop(state);
        slot.changed.notify_all();
        result
    }

    /// Typed accessor for the sentiment backend.
    pub fn sentiment(&self) -> Result<Arc<dyn SentimentBackend>, BackendError> {
        match self.get(BackendKind::Sentiment)? {
            BackendHandle::Sentiment(backend) => Ok(backend),
            other => Err(BackendError::ConstructionFailed {
                kind: BackendKind::Sentiment,
                reason: format!("got a {} backend", other.kind()),
            }),
        }
    }

    /// Typed accessor for the summary backend.
    pub fn summarizer(&self) -> Result<Arc<dyn SummaryBackend>, BackendError> {
        match self.get(BackendKind::Summary)? {
            BackendHandle::Summary(backend) => Ok(backend),
            other => Err(BackendError::ConstructionFailed {
                kind: BackendKind::Summary,
                reason: format!("got a {} backend", other.kind()),
            }),
        }
    }

    pub fn status(&self, kind: BackendKind) -> BackendStatus {
        match &*self.slot(kind).lock() {
            SlotState::Uninitialized => BackendStatus::Uninitialized,
            SlotState::Initializing => BackendStatus::Initializing,
            SlotState::Ready(_) => BackendStatus::Ready,
            SlotState::Failed(reason) => BackendStatus::Failed(reason.clone()),
        }
    }

    /// Release every backend and return all slots to `Uninitialized`.
    ///
    /// Waits for in-flight construction first. Handles already given out stay
    /// valid for their holders. Safe to call when nothing was built.
    pub fn shutdown(&self) {
        for kind in BackendKind::ALL {
            let slot = self.slot(kind);
            let mut state = slot.lock();
            while matches!(*state, SlotState::Initializing) {
                state = slot.wait(state);
            }
            if let SlotState::Ready(handle) = &*state {
                tracing::info!("Releasing {} backend '{}'", kind, handle.backend_id());
            }
            *state = SlotState::Uninitialized;
        }
    }
}
