//! Best-effort secondary operations.
//!
//! Audit writes are observability, not correctness: they must never
//! make a user-visible operation fail. [`with_audit`] encodes the
//! call-site pattern once — primary first, secondary only on success,
//! secondary failures logged and swallowed.

use std::future::Future;

use tracing::warn;

/// Run the audit step after a successful primary operation.
///
/// - primary `Err`: returned unchanged, audit is not attempted
/// - primary `Ok` + audit `Ok`: primary result returned
/// - primary `Ok` + audit `Err`: failure logged at warn, primary
///   result still returned
pub async fn with_audit<T, E, A, Fut, R, AE>(primary: Result<T, E>, audit: A) -> Result<T, E>
where
    A: FnOnce(&T) -> Fut,
    Fut: Future<Output = Result<R, AE>>,
    AE: std::fmt::Display,
{
    match primary {
        Ok(value) => {
            if let Err(err) = audit(&value).await {
                warn!(error = %err, "failed to store audit record, continuing");
            }
            Ok(value)
        }
        Err(err) => Err(err),
    }
}
