//! Structured engine events
//!
//! Every attempt and transition emits an event. The sink is fire-and-forget
//! and infallible from the engine's point of view — emitting is synchronous
//! and its result is never inspected, so a missing or slow consumer can
//! never stall a round.

use std::time::Duration;

use elective_client::Target;
use tracing::{debug, info, warn};

/// Engine lifecycle and per-attempt events.
#[derive(Debug, Clone)]
pub enum Event {
    RoundStarted {
        round: u64,
    },
    /// Probe failed for a recoverable, non-credential reason.
    ProbeFailed {
        target: Target,
        detail: String,
    },
    /// Every report for the target was full or rejected this attempt.
    SeatFull {
        target: Target,
    },
    SubmitAccepted {
        target: Target,
        status: u16,
        /// Raw response body, surfaced because a 2xx can still carry an
        /// embedded semantic failure.
        body: String,
    },
    SubmitRejected {
        target: Target,
        status: u16,
        detail: String,
    },
    AuthExpired {
        target: Target,
    },
    RefreshStarted,
    RefreshSucceeded,
    RefreshFailed {
        detail: String,
    },
    Backoff {
        delay: Duration,
    },
    /// Terminal event; states which outcome ended the run.
    Finished {
        summary: String,
    },
}

/// Best-effort event consumer.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Sink that maps events onto structured tracing records.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event {
            Event::RoundStarted { round } => debug!(round, "round started"),
            Event::ProbeFailed { target, detail } => {
                debug!(target = %target, detail = %detail, "probe failed")
            }
            Event::SeatFull { target } => debug!(target = %target, "no open seat"),
            Event::SubmitAccepted {
                target,
                status,
                body,
            } => info!(target = %target, status, body = %body, "submission accepted"),
            Event::SubmitRejected {
                target,
                status,
                detail,
            } => info!(target = %target, status, detail = %detail, "submission rejected"),
            Event::AuthExpired { target } => warn!(target = %target, "credential expired"),
            Event::RefreshStarted => info!("credential refresh started"),
            Event::RefreshSucceeded => info!("credential refresh succeeded"),
            Event::RefreshFailed { detail } => warn!(detail = %detail, "credential refresh failed"),
            Event::Backoff { delay } => debug!(delay_ms = delay.as_millis() as u64, "backing off"),
            Event::Finished { summary } => info!(summary = %summary, "run finished"),
        }
    }
}
