//! Domain types shared between the client and the acquisition engine

use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;

/// One course section the engine is trying to enroll into.
///
/// Immutable after configuration load. At least one of `course_code` and
/// `teacher_code` must be non-blank; config validation enforces this before
/// the engine ever sees a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub course_code: String,
    pub teacher_code: String,
    /// Section-type tag sent as `teachingClassType` / `clazzType`.
    pub class_type: String,
}

impl Target {
    /// Compact identity for log records and events.
    pub fn label(&self) -> String {
        format!("{}/{}", self.course_code, self.teacher_code)
    }

    /// Whether both identifying codes are blank (an unprobeable target).
    pub fn is_blank(&self) -> bool {
        self.course_code.trim().is_empty() && self.teacher_code.trim().is_empty()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Bearer credential for the registration service.
///
/// The token is opaque to us; the remote side decides when it has expired.
/// `issued_at` records when this process obtained it, for log context only.
/// Debug output redacts the token.
#[derive(Clone)]
pub struct Credential {
    token: String,
    issued_at: Instant,
}

impl Credential {
    pub fn new(token: String) -> Self {
        Self {
            token,
            issued_at: Instant::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Time since this credential was obtained by this process.
    pub fn age(&self) -> Duration {
        self.issued_at.elapsed()
    }

    pub fn is_blank(&self) -> bool {
        self.token.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Occupancy of one class instance, as reported by the listing endpoint.
///
/// One course code may resolve to several rows (different teachers or time
/// slots); each row is evaluated independently. `secret_token` is the
/// per-offer nonce the add endpoint requires; it is only valid together
/// with the probe that produced it.
#[derive(Debug, Clone, Deserialize)]
pub struct OccupancyReport {
    #[serde(rename = "classCapacity")]
    pub capacity: u32,
    #[serde(rename = "numberOfSelected")]
    pub selected: u32,
    #[serde(rename = "classInstanceId")]
    pub class_instance_id: String,
    #[serde(rename = "secretVal")]
    pub secret_token: String,
}

impl OccupancyReport {
    /// Whether the section appears to have a free seat.
    ///
    /// The remote side still arbitrates the race; this only gates whether a
    /// submission is worth the write.
    pub fn has_open_seat(&self) -> bool {
        self.selected < self.capacity
    }
}

/// Successful submission response, surfaced verbatim for audit.
///
/// The remote occasionally returns 2xx with a semantic failure embedded in
/// the body ("already enrolled", rule conflicts). No marker format is
/// documented, so the body is passed through unparsed.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub status: u16,
    pub body: String,
}
