//! Error taxonomy for probe and submit operations
//!
//! Probe and submit have separate enums because the engine reacts to them
//! differently: a probe failure ends the attempt, while a submit rejection
//! only ends the current report and siblings may still succeed.
//!
//! 401/403 from either endpoint is a dedicated variant rather than a
//! generic transport error — credential expiry drives the refresh state
//! machine and must be distinguishable from an outage.

/// Errors from the occupancy listing endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Caller error: both course and teacher code are blank. Never retried.
    #[error("target has neither course code nor teacher code")]
    EmptyTarget,

    /// Caller error: blank credential. Never retried.
    #[error("credential token is empty")]
    EmptyCredential,

    /// Credential rejected by the listing endpoint.
    #[error("listing endpoint rejected credential ({status})")]
    AuthExpired { status: u16 },

    /// Non-2xx status other than an authorization rejection.
    #[error("listing endpoint returned {status}")]
    Transport { status: u16 },

    /// Connection or timeout failure before a status was received.
    #[error("listing request failed: {0}")]
    Network(String),

    /// Response was not the expected envelope shape.
    #[error("malformed listing response: {0}")]
    MalformedResponse(String),
}

/// Errors from the enrollment (add) endpoint.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Credential rejected by the add endpoint.
    #[error("add endpoint rejected credential ({status})")]
    AuthExpired { status: u16 },

    /// Remote business-rule refusal (seat taken between probe and submit,
    /// stale secret token, schedule conflict, ...).
    #[error("enrollment rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Connection or timeout failure before a status was received.
    #[error("add request failed: {0}")]
    Network(String),
}
