//! Shared credential cell and the provider seam
//!
//! The cell is the only shared mutable state in the engine. Readers take a
//! cloned snapshot under a read lock (never a torn value); writes go
//! through `RefreshCoordinator`, which holds the single-writer discipline.
//! Each replacement bumps a generation counter — the coordinator uses it to
//! tell "the credential I saw fail" apart from "a credential someone
//! already refreshed while I waited".

use std::future::Future;
use std::pin::Pin;

use elective_client::Credential;
use tokio::sync::RwLock;
use tracing::debug;

/// Consistent read of the cell: the credential (if any) plus the
/// generation it belongs to.
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    pub credential: Option<Credential>,
    pub generation: u64,
}

struct CellState {
    credential: Option<Credential>,
    generation: u64,
}

/// Single shared slot holding the current bearer credential.
///
/// May start empty; the first attempt then reports expiry and triggers the
/// initial login through the normal refresh path.
pub struct CredentialCell {
    state: RwLock<CellState>,
}

impl CredentialCell {
    pub fn new(initial: Option<Credential>) -> Self {
        Self {
            state: RwLock::new(CellState {
                credential: initial,
                generation: 0,
            }),
        }
    }

    /// Read a consistent snapshot of the current credential and generation.
    pub async fn snapshot(&self) -> CredentialSnapshot {
        let state = self.state.read().await;
        CredentialSnapshot {
            credential: state.credential.clone(),
            generation: state.generation,
        }
    }

    /// Current generation without cloning the credential.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Replace the credential, bumping the generation. Returns the new
    /// generation. Only the refresh coordinator calls this.
    pub(crate) async fn replace(&self, credential: Credential) -> u64 {
        let mut state = self.state.write().await;
        state.credential = Some(credential);
        state.generation += 1;
        debug!(generation = state.generation, "credential cell replaced");
        state.generation
    }
}

/// Errors from the external credential provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("login flow failed: {0}")]
    LoginFailed(String),

    #[error("login flow produced an empty credential")]
    EmptyCredential,

    #[error("credential refresh is not configured: {0}")]
    Unavailable(String),
}

/// External collaborator that mints a fresh credential.
///
/// The implementation is opaque to the engine — typically an interactive
/// browser login driven out-of-band — and may block its caller for a long
/// time. The refresh coordinator guarantees it is never invoked
/// concurrently with itself. Uses a `Pin<Box<dyn Future>>` return type for
/// dyn-compatibility (`Arc<dyn CredentialProvider>`).
pub trait CredentialProvider: Send + Sync {
    fn obtain(&self)
    -> Pin<Box<dyn Future<Output = Result<Credential, ProviderError>> + Send + '_>>;
}
