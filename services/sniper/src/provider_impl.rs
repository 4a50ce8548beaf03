//! Credential provider implementations
//!
//! The engine only knows the `CredentialProvider` trait; how a fresh token
//! is minted lives here. The real login flow (browser form-fill, captcha
//! wait) stays outside this process behind a subprocess boundary: the
//! configured command does whatever it needs to and prints the token on
//! stdout. The refresh coordinator guarantees the command is never run
//! twice concurrently.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use acquire::{CredentialProvider, ProviderError};
use elective_client::Credential;
use tracing::{info, warn};

/// Mints credentials by running an external login command.
pub struct CommandProvider {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandProvider {
    /// `argv` is the full command line (program first); `timeout` bounds
    /// the whole login, which may sit waiting on interactive input.
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self { argv, timeout }
    }

    async fn run_login(&self) -> Result<Credential, ProviderError> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| ProviderError::Unavailable("login command is empty".into()))?;

        info!(command = %program, "running external login");

        let mut command = tokio::process::Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                ProviderError::LoginFailed(format!(
                    "login command timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ProviderError::LoginFailed(format!("spawning login command: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::LoginFailed(format!(
                "login command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if token.is_empty() {
            return Err(ProviderError::EmptyCredential);
        }

        info!("external login produced a fresh credential");
        Ok(Credential::new(token))
    }
}

impl CredentialProvider for CommandProvider {
    fn obtain(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Credential, ProviderError>> + Send + '_>> {
        Box::pin(self.run_login())
    }
}

/// Provider used when no login command is configured. Refresh always
/// fails, the engine retains the stale token, and the operator sees a
/// refresh-failure event every time an expired round asks again.
pub struct RefreshDisabled;

impl CredentialProvider for RefreshDisabled {
    fn obtain(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Credential, ProviderError>> + Send + '_>> {
        Box::pin(async {
            warn!("credential expired but no login_command is configured");
            Err(ProviderError::Unavailable(
                "no login_command configured; supply a fresh token and restart".into(),
            ))
        })
    }
}
