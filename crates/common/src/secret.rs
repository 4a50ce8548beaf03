//! Secret wrapper for the bearer token
//!
//! The session token grants full enrollment rights for the account, so it
//! must never appear in Debug output, logs, or panic messages. The inner
//! string is zeroized on drop.

use std::fmt;
use zeroize::Zeroize;

/// Sensitive string value, redacted in Debug/Display and zeroized on drop.
pub struct Secret(String);

impl Secret {
    /// Wrap a sensitive string.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly, at the request boundary).
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the wrapped value is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
