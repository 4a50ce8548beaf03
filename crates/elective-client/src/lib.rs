//! Client for the remote elective registration service
//!
//! Speaks the two-endpoint protocol of the registration backend: a listing
//! endpoint that reports per-section occupancy, and an add endpoint that
//! claims a seat. Both are form-encoded POSTs authorized by an opaque
//! bearer token.
//!
//! The `ElectiveApi` trait is the seam between this crate and the
//! acquisition engine: the engine composes probe and submit without
//! knowing about HTTP, and tests script the seam directly.
//!
//! Occupancy data is intentionally short-lived. A probe's `secretVal` is a
//! single-use nonce tied to that listing response; submitting a stale one
//! is rejected by the remote side, so reports are consumed in the same
//! attempt that produced them and never cached.

pub mod api;
pub mod error;
pub mod http;
pub mod identity;
pub mod types;

pub use api::ElectiveApi;
pub use error::{ProbeError, SubmitError};
pub use http::ElectiveClient;
pub use types::{Credential, OccupancyReport, SubmitReceipt, Target};
