//! Service error types.

use harvest_graph::GraphError;

/// Errors surfaced by domain operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No plant with the given id.
    #[error("plant {0} not found")]
    NotFound(u64),

    /// Graph store failure on an operation with no degraded mode
    /// (audit listing).
    #[error(transparent)]
    Graph(#[from] GraphError),
}
