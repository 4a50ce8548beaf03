//! Probe/submit seam between the protocol client and the engine
//!
//! The acquisition engine only ever talks to this trait. The HTTP client
//! implements it for production; engine tests script it with canned
//! responses. Uses `Pin<Box<dyn Future>>` return types for
//! dyn-compatibility (`Arc<dyn ElectiveApi>`).

use std::future::Future;
use std::pin::Pin;

use crate::error::{ProbeError, SubmitError};
use crate::types::{Credential, OccupancyReport, SubmitReceipt, Target};

/// The two remote operations the engine composes into an attempt.
///
/// Within one attempt probe strictly precedes submit, and a submit only
/// references reports produced by that same probe.
pub trait ElectiveApi: Send + Sync {
    /// Query occupancy for one target.
    ///
    /// Returns every class-instance row the listing resolves the target to,
    /// in listing order. An empty vector means the target matched nothing
    /// this round (not an error).
    fn probe<'a>(
        &'a self,
        target: &'a Target,
        credential: &'a Credential,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<OccupancyReport>, ProbeError>> + Send + 'a>>;

    /// Attempt to claim a seat described by `report`.
    ///
    /// Callers must only submit reports with an open seat; a full report is
    /// short-circuited locally to avoid wasted remote writes.
    fn submit<'a>(
        &'a self,
        target: &'a Target,
        report: &'a OccupancyReport,
        credential: &'a Credential,
    ) -> Pin<Box<dyn Future<Output = Result<SubmitReceipt, SubmitError>> + Send + 'a>>;
}
