//! Cancellation and deadline propagation for collaborator calls.
//!
//! The engine has no timeout policy of its own. Callers hand in a
//! [`CallGuard`] and every repository or signer call is raced against it.
//! Nothing is retried.

use crate::error::AuthError;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct CallGuard {
    token: CancellationToken,
    timeout: Option<Duration>,
}

impl CallGuard {
    pub fn new(token: CancellationToken, timeout: Option<Duration>) -> Self {
        Self { token, timeout }
    }

    /// A guard that never cancels and never times out
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(CancellationToken::new(), Some(timeout))
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `call` until it completes, the caller cancels, or the deadline passes
    pub async fn run<T, E, F>(&self, what: &str, call: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<AuthError>,
    {
        if self.token.is_cancelled() {
            debug!("Skipping {what}: caller already cancelled");
            return Err(AuthError::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                result = call => result.map_err(Into::into),
                _ = self.token.cancelled() => {
                    debug!("{what} cancelled by caller");
                    Err(AuthError::Cancelled)
                }
            }
        };

        match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("{what} exceeded its deadline of {timeout:?}");
                    Err(AuthError::Timeout)
                }
            },
            None => guarded.await,
        }
    }
}
