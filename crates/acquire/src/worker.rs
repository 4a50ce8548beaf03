//! Per-target acquisition attempt
//!
//! One attempt is: snapshot the credential, probe occupancy, and walk the
//! returned reports in listing order, submitting for the first open seat.
//! The first accepted submission wins — the race is against other clients
//! on the remote server, not between sibling reports, so evaluation stops
//! there. A rejected report does not end the attempt; a sibling section
//! may legitimately accept.
//!
//! Authorization failure at either step requests a coordinated refresh
//! (passing the generation of the snapshot that failed) before reporting
//! `AuthExpired`, so the next round runs with a fresh credential.

use std::sync::Arc;

use elective_client::{ElectiveApi, ProbeError, SubmitError, Target};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::credential::CredentialCell;
use crate::events::{Event, EventSink};
use crate::outcome::AttemptOutcome;
use crate::refresh::RefreshCoordinator;

/// Stateless per-attempt composer of probe and submit. One instance is
/// shared by every target.
pub struct Worker {
    api: Arc<dyn ElectiveApi>,
    cell: Arc<CredentialCell>,
    refresher: Arc<RefreshCoordinator>,
    events: Arc<dyn EventSink>,
}

impl Worker {
    pub fn new(
        api: Arc<dyn ElectiveApi>,
        cell: Arc<CredentialCell>,
        refresher: Arc<RefreshCoordinator>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            api,
            cell,
            refresher,
            events,
        }
    }

    /// Run one acquisition attempt for `target`.
    pub async fn attempt(&self, target: &Target) -> AttemptOutcome {
        let attempt_id = Uuid::new_v4();

        let snapshot = self.cell.snapshot().await;
        let Some(credential) = snapshot.credential else {
            debug!(%attempt_id, target = %target, "no credential yet, requesting login");
            self.events.emit(Event::AuthExpired {
                target: target.clone(),
            });
            self.refresher.ensure_fresh(snapshot.generation).await;
            return AttemptOutcome::AuthExpired;
        };

        let reports = match self.api.probe(target, &credential).await {
            Ok(reports) => reports,
            Err(e @ (ProbeError::AuthExpired { .. } | ProbeError::MalformedResponse(_))) => {
                // A malformed listing is the usual symptom of an expired
                // session: the remote serves its login page with status 200
                warn!(%attempt_id, target = %target, error = %e, "probe indicates expired credential");
                self.events.emit(Event::AuthExpired {
                    target: target.clone(),
                });
                self.refresher.ensure_fresh(snapshot.generation).await;
                return AttemptOutcome::AuthExpired;
            }
            Err(e) => {
                debug!(%attempt_id, target = %target, error = %e, "probe failed");
                self.events.emit(Event::ProbeFailed {
                    target: target.clone(),
                    detail: e.to_string(),
                });
                return AttemptOutcome::TransientError {
                    detail: e.to_string(),
                };
            }
        };

        if reports.is_empty() {
            self.events.emit(Event::SeatFull {
                target: target.clone(),
            });
            return AttemptOutcome::SeatFull;
        }

        for report in &reports {
            if !report.has_open_seat() {
                debug!(
                    %attempt_id,
                    target = %target,
                    class_instance = %report.class_instance_id,
                    capacity = report.capacity,
                    selected = report.selected,
                    "section full"
                );
                continue;
            }

            match self.api.submit(target, report, &credential).await {
                Ok(receipt) => {
                    info!(
                        %attempt_id,
                        target = %target,
                        class_instance = %report.class_instance_id,
                        "seat claimed"
                    );
                    self.events.emit(Event::SubmitAccepted {
                        target: target.clone(),
                        status: receipt.status,
                        body: receipt.body.clone(),
                    });
                    return AttemptOutcome::Success { receipt };
                }
                Err(e @ SubmitError::AuthExpired { .. }) => {
                    warn!(%attempt_id, target = %target, error = %e, "submission rejected credential");
                    self.events.emit(Event::AuthExpired {
                        target: target.clone(),
                    });
                    self.refresher.ensure_fresh(snapshot.generation).await;
                    return AttemptOutcome::AuthExpired;
                }
                Err(SubmitError::Rejected { status, body }) => {
                    // A sibling section may still accept
                    debug!(
                        %attempt_id,
                        target = %target,
                        class_instance = %report.class_instance_id,
                        status,
                        "submission rejected, trying next report"
                    );
                    self.events.emit(Event::SubmitRejected {
                        target: target.clone(),
                        status,
                        detail: body,
                    });
                }
                Err(e @ SubmitError::Network(_)) => {
                    debug!(%attempt_id, target = %target, error = %e, "submission failed in transit");
                    return AttemptOutcome::TransientError {
                        detail: e.to_string(),
                    };
                }
            }
        }

        self.events.emit(Event::SeatFull {
            target: target.clone(),
        });
        AttemptOutcome::SeatFull
    }
}
