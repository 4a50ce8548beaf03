//! Single-flight credential refresh
//!
//! Refreshing drives an interactive external login, so two refreshes must
//! never run concurrently — they are slow and may conflict on shared
//! browser state. A mutex gate serializes refreshes; the generation
//! re-check under the gate collapses every request made against the same
//! failed credential into one provider call, and every waiter observes the
//! credential that call produced (or the same failure).

use std::sync::Arc;

use tracing::{info, warn};

use crate::credential::{CredentialCell, CredentialProvider};
use crate::events::{Event, EventSink};

/// Coordinates all writes to the credential cell.
pub struct RefreshCoordinator {
    cell: Arc<CredentialCell>,
    provider: Arc<dyn CredentialProvider>,
    events: Arc<dyn EventSink>,
    gate: tokio::sync::Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(
        cell: Arc<CredentialCell>,
        provider: Arc<dyn CredentialProvider>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            cell,
            provider,
            events,
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Ensure the cell holds a credential newer than `observed_generation`.
    ///
    /// `observed_generation` is the generation of the snapshot whose
    /// credential just failed. If the cell has already moved past it when
    /// the gate is acquired, someone else completed the refresh — return
    /// without a provider call.
    ///
    /// Returns true if the cell now holds a newer credential. On provider
    /// failure the previous credential is retained (stale-but-present is
    /// preferable to empty) and false is returned; the next expired attempt
    /// will request another refresh.
    pub async fn ensure_fresh(&self, observed_generation: u64) -> bool {
        let _gate = self.gate.lock().await;

        if self.cell.generation().await > observed_generation {
            return true;
        }

        self.events.emit(Event::RefreshStarted);
        info!(observed_generation, "refreshing credential");

        match self.provider.obtain().await {
            Ok(credential) => {
                let generation = self.cell.replace(credential).await;
                info!(generation, "credential refreshed");
                self.events.emit(Event::RefreshSucceeded);
                true
            }
            Err(e) => {
                warn!(error = %e, "credential refresh failed, keeping previous credential");
                self.events.emit(Event::RefreshFailed {
                    detail: e.to_string(),
                });
                false
            }
        }
    }
}
