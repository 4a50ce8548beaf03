//! Seat acquisition engine
//!
//! Drives the poll/decide/submit loop against the registration service:
//! each round probes occupancy for every tracked target and races to claim
//! any seat that appears free. The loop is intentionally unbounded — it
//! runs until a seat is acquired, a configured round cap is reached, or the
//! operator cancels.
//!
//! Credential lifecycle:
//! 1. The cell is seeded from configuration (or starts empty)
//! 2. Workers read a snapshot of the cell per attempt
//! 3. A 401/403 or malformed listing marks the credential expired
//! 4. The refresh coordinator runs at most one provider call at a time;
//!    every waiter observes the resulting credential
//! 5. On refresh failure the stale credential is retained and the loop
//!    keeps going, surfacing repeated failures to the operator
//!
//! All remote I/O goes through the `ElectiveApi` seam, so the whole engine
//! is testable against scripted responses.

pub mod backoff;
pub mod credential;
pub mod driver;
pub mod events;
pub mod outcome;
pub mod refresh;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use backoff::jittered_delay;
pub use credential::{CredentialCell, CredentialProvider, CredentialSnapshot, ProviderError};
pub use driver::{Driver, DriverConfig};
pub use events::{Event, EventSink, TracingSink};
pub use outcome::{AttemptOutcome, RoundResult, TerminalOutcome};
pub use refresh::RefreshCoordinator;
pub use worker::Worker;
