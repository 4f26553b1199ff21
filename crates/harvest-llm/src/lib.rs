//! # harvest-llm
//!
//! Resilient client for the local Ollama inference server:
//!
//! - **Availability probe**: one-time startup check (liveness, model
//!   listing, optional slow model pull) under its own generous retry
//!   budget — the server may still be booting when this process starts
//! - **Streaming generation**: `POST /api/generate` with incremental
//!   newline-delimited JSON aggregation, bounded transport retry, and a
//!   fixed fallback string so generation is total for callers
//!
//! The [`TextGenerator`] trait is the seam the service layer consumes;
//! [`OllamaClient`] is the production implementation.

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod ndjson;
pub mod probe;

pub use client::{OllamaClient, TextGenerator, FALLBACK_TEXT};
pub use error::LlmError;
pub use probe::ModelAvailability;
