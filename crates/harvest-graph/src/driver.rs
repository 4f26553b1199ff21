//! Bolt driver seam.
//!
//! [`ConnectionManager`](crate::ConnectionManager) talks to the store
//! through these traits rather than a concrete driver, so lifecycle
//! behavior (staleness, retry, teardown) is testable against scripted
//! fakes. The production implementation is
//! [`Neo4jDriver`](crate::Neo4jDriver).

use std::sync::Arc;

use async_trait::async_trait;
use harvest_core::Interaction;

use crate::error::GraphError;

/// Opens bolt sessions. One driver per process.
#[async_trait]
pub trait BoltDriver: Send + Sync {
    /// Open a new session against the store.
    async fn connect(&self) -> Result<Arc<dyn BoltSession>, GraphError>;
}

/// A live session handle.
///
/// Handles are opaque to callers; only the connection manager holds
/// them, and it never reuses a handle older than the staleness TTL.
#[async_trait]
pub trait BoltSession: Send + Sync {
    /// Trivial round-trip (`RETURN 1`) confirming the session is live.
    async fn probe(&self) -> Result<(), GraphError>;

    /// Persist one audit record. Append-only; records are never
    /// updated or deleted.
    async fn create_interaction(&self, record: &Interaction) -> Result<(), GraphError>;

    /// Fetch all audit records, newest first. Re-queries on every
    /// call; no server-side cursor is retained.
    async fn list_interactions(&self) -> Result<Vec<Interaction>, GraphError>;

    /// Release the session. Idempotent.
    async fn close(&self) -> Result<(), GraphError>;
}
