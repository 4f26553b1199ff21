//! # harvest-graph
//!
//! Resilient client for the bolt graph store that holds the audit log.
//!
//! The store is written through a single lazily-established connection
//! handle managed by [`ConnectionManager`]: staleness-based
//! reconnection, bounded retry on transient failures, and a liveness
//! probe before any handle is trusted. The bolt driver itself sits
//! behind the [`BoltDriver`] / [`BoltSession`] seam so tests can
//! substitute scripted fakes; production uses [`Neo4jDriver`].

#![deny(unsafe_code)]

pub mod driver;
pub mod error;
pub mod manager;
pub mod neo4j;

pub use driver::{BoltDriver, BoltSession};
pub use error::GraphError;
pub use manager::ConnectionManager;
pub use neo4j::Neo4jDriver;
