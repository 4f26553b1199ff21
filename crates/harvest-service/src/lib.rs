//! # harvest-service
//!
//! Domain operations for the plant journal: an in-memory record store,
//! harvest-guidance generation through the inference client, and
//! best-effort audit writes to the graph store.
//!
//! The failure-containment contract lives here: a primary operation's
//! result is never affected by its secondary audit write. Audit
//! failures are logged and swallowed ([`with_audit`]); generation
//! failures surface only as fallback text inside the domain result.

#![deny(unsafe_code)]

pub mod error;
pub mod resilient;
pub mod service;
pub mod store;

pub use error::ServiceError;
pub use resilient::with_audit;
pub use service::{NewPlant, PlantService};
pub use store::PlantStore;
