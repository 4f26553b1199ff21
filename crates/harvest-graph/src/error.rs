//! Graph store error taxonomy.

use harvest_core::Retryable;

/// Errors from graph store operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The store is unreachable (refused, reset, not yet up).
    #[error("graph store unavailable: {detail}")]
    Unavailable {
        /// Error description.
        detail: String,
    },

    /// The store rejected our credentials.
    ///
    /// Treated as retryable: the upstream store has been observed to
    /// reject auth transiently while still warming up.
    #[error("graph store rejected authentication: {detail}")]
    AuthRejected {
        /// Error description.
        detail: String,
    },

    /// Any other driver or query failure. Not retried.
    #[error("graph store error: {detail}")]
    Backend {
        /// Error description.
        detail: String,
    },
}

impl Retryable for GraphError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::AuthRejected { .. }
        )
    }
}
