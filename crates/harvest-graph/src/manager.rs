//! Connection lifecycle management for the graph store.
//!
//! One logical connection handle per process. The handle is established
//! lazily, probed before first use, discarded once it exceeds the
//! staleness TTL, and re-established under the configured retry policy.
//! All mutable state sits behind a single async mutex so concurrent
//! callers racing on reconnection serialize instead of double-closing
//! or leaking a handle.

use std::sync::Arc;
use std::time::Duration;

use harvest_core::{run_with_retry, Interaction, Retryable, RetryPolicy};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::driver::{BoltDriver, BoltSession};
use crate::error::GraphError;

/// Manages the process-wide graph store connection.
pub struct ConnectionManager {
    driver: Arc<dyn BoltDriver>,
    retry: RetryPolicy,
    staleness_ttl: Duration,
    state: Mutex<ConnectionState>,
}

/// Mutable connection state. Owned exclusively by the manager.
struct ConnectionState {
    session: Option<Arc<dyn BoltSession>>,
    established_at: Option<Instant>,
}

impl ConnectionState {
    /// Return the held session if it exists and is younger than `ttl`.
    fn fresh_session(&self, ttl: Duration) -> Option<Arc<dyn BoltSession>> {
        let session = self.session.as_ref()?;
        let established_at = self.established_at?;
        if established_at.elapsed() > ttl {
            return None;
        }
        Some(Arc::clone(session))
    }
}

impl ConnectionManager {
    /// Create a manager over `driver` with the given retry policy and
    /// staleness TTL.
    pub fn new(driver: Arc<dyn BoltDriver>, retry: RetryPolicy, staleness_ttl: Duration) -> Self {
        Self {
            driver,
            retry,
            staleness_ttl,
            state: Mutex::new(ConnectionState {
                session: None,
                established_at: None,
            }),
        }
    }

    /// Return a live session handle, (re)connecting if none exists or
    /// the held one is stale.
    ///
    /// Reconnection runs under the retry policy: the old handle is
    /// closed defensively (close errors are swallowed), a new session
    /// is opened, and a `RETURN 1` probe must succeed before the handle
    /// is installed. Only unavailable / auth-rejected errors are
    /// retried; anything else propagates immediately. On exhaustion the
    /// last error propagates and no handle is left installed.
    pub async fn ensure_connected(&self) -> Result<Arc<dyn BoltSession>, GraphError> {
        let mut state = self.state.lock().await;
        if let Some(session) = state.fresh_session(self.staleness_ttl) {
            return Ok(session);
        }
        self.reconnect_locked(&mut state).await
    }

    async fn reconnect_locked(
        &self,
        state: &mut ConnectionState,
    ) -> Result<Arc<dyn BoltSession>, GraphError> {
        if let Some(old) = state.session.take() {
            if let Err(err) = old.close().await {
                warn!(error = %err, "error closing stale graph session, discarding anyway");
            }
        }
        state.established_at = None;

        let driver = Arc::clone(&self.driver);
        let session = run_with_retry(&self.retry, "graph.connect", move || {
            let driver = Arc::clone(&driver);
            async move {
                let session = driver.connect().await?;
                session.probe().await?;
                Ok(session)
            }
        })
        .await?;

        state.session = Some(Arc::clone(&session));
        state.established_at = Some(Instant::now());
        info!("graph store connection established");
        Ok(session)
    }

    /// Persist one audit record and return it.
    ///
    /// On a retryable-class failure the held handle is torn down so the
    /// next call performs a full reconnect, then the error propagates.
    pub async fn write_audit(
        &self,
        user_input: &str,
        llm_response: &str,
    ) -> Result<Interaction, GraphError> {
        let session = self.ensure_connected().await?;
        let record = Interaction::new(user_input, llm_response);
        match session.create_interaction(&record).await {
            Ok(()) => Ok(record),
            Err(err) => {
                if err.is_retryable() {
                    warn!(error = %err, "transient failure writing audit record, tearing down handle");
                    self.shutdown().await;
                }
                Err(err)
            }
        }
    }

    /// Fetch all audit records, newest first.
    ///
    /// Re-queries the store on every call. Tears down the handle on a
    /// retryable-class failure, like [`write_audit`](Self::write_audit).
    pub async fn list_audits(&self) -> Result<Vec<Interaction>, GraphError> {
        let session = self.ensure_connected().await?;
        match session.list_interactions().await {
            Ok(records) => Ok(records),
            Err(err) => {
                if err.is_retryable() {
                    warn!(error = %err, "transient failure listing audit records, tearing down handle");
                    self.shutdown().await;
                }
                Err(err)
            }
        }
    }

    /// Release the held handle unconditionally.
    ///
    /// Idempotent; close errors are swallowed. A subsequent
    /// [`ensure_connected`](Self::ensure_connected) starts clean.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.take() {
            if let Err(err) = session.close().await {
                warn!(error = %err, "error closing graph session during shutdown");
            }
        }
        state.established_at = None;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
