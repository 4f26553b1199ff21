//! # harvest-core
//!
//! Foundation types shared by the harvest client crates:
//!
//! - **Retry**: [`RetryPolicy`] (constant backoff), the [`Retryable`]
//!   error classification trait, and the [`run_with_retry`] executor
//! - **Models**: [`Plant`] records and append-only [`Interaction`]
//!   audit entries

#![deny(unsafe_code)]

pub mod models;
pub mod retry;

pub use models::{Interaction, Plant};
pub use retry::{run_with_retry, Retryable, RetryPolicy};
