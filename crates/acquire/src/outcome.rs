//! Attempt and round outcome types
//!
//! `AttemptOutcome` is what one worker attempt reduces to; `RoundResult`
//! aggregates a round; `TerminalOutcome` is what ends the whole run. All
//! three are round-scoped data, discarded once the driver has acted on
//! them — nothing here persists across rounds.

use elective_client::{SubmitReceipt, Target};

/// Result of one worker attempt for one target.
///
/// Per-report remote rejections do not surface here: a rejected report may
/// have a sibling that succeeds, so rejections are reported through the
/// event sink and an attempt where everything was full or rejected reduces
/// to `SeatFull`.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// A seat was claimed. Terminal for the whole run.
    Success { receipt: SubmitReceipt },
    /// No open seat, or every open report was rejected remotely.
    SeatFull,
    /// The credential was rejected; a refresh has been requested.
    AuthExpired,
    /// Transport, network, or other recoverable failure. Retried next round.
    TransientError { detail: String },
}

impl AttemptOutcome {
    /// Outcome label for logs and events.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success { .. } => "success",
            AttemptOutcome::SeatFull => "seat_full",
            AttemptOutcome::AuthExpired => "auth_expired",
            AttemptOutcome::TransientError { .. } => "transient_error",
        }
    }
}

/// Aggregate of all attempt outcomes in one round, in dispatch order for
/// sequential rounds and completion order for concurrent ones.
#[derive(Debug, Default)]
pub struct RoundResult {
    pub outcomes: Vec<(Target, AttemptOutcome)>,
}

impl RoundResult {
    pub fn push(&mut self, target: Target, outcome: AttemptOutcome) {
        self.outcomes.push((target, outcome));
    }

    pub fn any_success(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, o)| matches!(o, AttemptOutcome::Success { .. }))
    }

    pub fn any_auth_expired(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, o)| matches!(o, AttemptOutcome::AuthExpired))
    }

    pub fn all_seat_full(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, o)| matches!(o, AttemptOutcome::SeatFull))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// What ended the run.
#[derive(Debug)]
pub enum TerminalOutcome {
    /// A submission was accepted.
    Enrolled {
        target: Target,
        round: u64,
        receipt: SubmitReceipt,
    },
    /// The operator-configured round cap was reached without success.
    RoundLimitReached { rounds: u64 },
    /// External cancellation took effect.
    Cancelled { round: u64 },
}

impl TerminalOutcome {
    /// One-line summary for the final log record.
    pub fn summary(&self) -> String {
        match self {
            TerminalOutcome::Enrolled { target, round, .. } => {
                format!("enrolled into {target} on round {round}")
            }
            TerminalOutcome::RoundLimitReached { rounds } => {
                format!("round limit reached after {rounds} rounds without success")
            }
            TerminalOutcome::Cancelled { round } => {
                format!("cancelled during round {round}")
            }
        }
    }
}
