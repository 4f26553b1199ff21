//! # harvest-settings
//!
//! Configuration for the harvest client crates, loaded from two layers
//! (in priority order):
//!
//! 1. **Compiled defaults** — [`Settings::default()`], tuned for the
//!    docker-compose layout (sibling `neo4j` and local Ollama).
//! 2. **Environment variables** — highest priority. Invalid values are
//!    ignored and the default is kept.
//!
//! Recognized variables:
//!
//! | Variable                       | Meaning                              |
//! |--------------------------------|--------------------------------------|
//! | `NEO4J_URI`                    | bolt endpoint (`bolt://neo4j:7687`)  |
//! | `NEO4J_USER`                   | bolt user (`neo4j`)                  |
//! | `NEO4J_PASSWORD`               | bolt password (`test1234`)           |
//! | `OLLAMA_HOST`                  | inference host (`localhost`)         |
//! | `OLLAMA_MODEL`                 | model name (`llama3.2`)              |
//! | `HARVEST_GRAPH_MAX_ATTEMPTS`      | graph retry budget (5)            |
//! | `HARVEST_GRAPH_RETRY_DELAY_MS`    | graph retry delay (5000)          |
//! | `HARVEST_GRAPH_STALENESS_SECS`    | connection staleness TTL (300)    |
//! | `HARVEST_PROBE_MAX_ATTEMPTS`      | probe retry budget (10)           |
//! | `HARVEST_PROBE_RETRY_DELAY_MS`    | probe retry delay (10000)         |
//! | `HARVEST_GENERATE_MAX_ATTEMPTS`   | generation retry budget (5)       |
//! | `HARVEST_GENERATE_RETRY_DELAY_MS` | generation retry delay (5000)     |
//! | `HARVEST_GENERATE_TIMEOUT_SECS`   | per-call generation timeout (300) |
//! | `HARVEST_PROBE_TIMEOUT_SECS`      | liveness/listing timeout (30)     |
//! | `HARVEST_PULL_TIMEOUT_SECS`       | model pull timeout (1800)         |

#![deny(unsafe_code)]

use harvest_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Graph store (audit log) connection settings.
    #[serde(default)]
    pub graph: GraphSettings,
    /// Inference server settings.
    #[serde(default)]
    pub llm: LlmSettings,
}

/// Bolt graph store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSettings {
    /// Bolt endpoint.
    pub uri: String,
    /// Bolt user.
    pub user: String,
    /// Bolt password.
    pub password: String,
    /// Maximum age of a connection handle before it is discarded and
    /// re-established, in seconds.
    pub staleness_ttl_secs: u64,
    /// Connection / write retry policy.
    pub retry: RetryPolicy,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://neo4j:7687".into(),
            user: "neo4j".into(),
            password: "test1234".into(),
            staleness_ttl_secs: 300,
            retry: RetryPolicy::new(5, 5_000),
        }
    }
}

/// Inference server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    /// Host of the Ollama server.
    pub host: String,
    /// Port of the Ollama server.
    pub port: u16,
    /// Model expected to be resident.
    pub model: String,
    /// Per-call timeout for generation, in seconds.
    pub generate_timeout_secs: u64,
    /// Timeout for liveness / model-listing probes, in seconds.
    pub probe_timeout_secs: u64,
    /// Timeout for the one-time model pull, in seconds. Pulls can run
    /// for many minutes on first boot.
    pub pull_timeout_secs: u64,
    /// Startup probe retry policy. Larger than the generate budget —
    /// the server may still be booting when we come up.
    pub probe_retry: RetryPolicy,
    /// Generation retry policy.
    pub generate_retry: RetryPolicy,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 11434,
            model: "llama3.2".into(),
            generate_timeout_secs: 300,
            probe_timeout_secs: 30,
            pull_timeout_secs: 1_800,
            probe_retry: RetryPolicy::new(10, 10_000),
            generate_retry: RetryPolicy::new(5, 5_000),
        }
    }
}

impl LlmSettings {
    /// Base URL of the inference server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Settings {
    /// Load settings: compiled defaults with env var overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        apply_env_overrides(&mut settings);
        debug!(
            graph_uri = %settings.graph.uri,
            llm_url = %settings.llm.base_url(),
            model = %settings.llm.model,
            "settings loaded"
        );
        settings
    }
}

/// Apply environment variable overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
///
/// Integers must parse and fall within range; invalid or empty values
/// are silently ignored (the default is kept). Split from the env read
/// so override wiring is testable without touching process state.
pub fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let int_u32 = |name: &str, min, max| lookup(name).and_then(|v| parse_u32(&v, min, max));
    let int_u64 = |name: &str, min, max| lookup(name).and_then(|v| parse_u64(&v, min, max));

    // ── Graph store ─────────────────────────────────────────────────
    if let Some(v) = string("NEO4J_URI") {
        settings.graph.uri = v;
    }
    if let Some(v) = string("NEO4J_USER") {
        settings.graph.user = v;
    }
    if let Some(v) = string("NEO4J_PASSWORD") {
        settings.graph.password = v;
    }
    if let Some(v) = int_u32("HARVEST_GRAPH_MAX_ATTEMPTS", 1, 100) {
        settings.graph.retry.max_attempts = v;
    }
    if let Some(v) = int_u64("HARVEST_GRAPH_RETRY_DELAY_MS", 0, 600_000) {
        settings.graph.retry.delay_ms = v;
    }
    if let Some(v) = int_u64("HARVEST_GRAPH_STALENESS_SECS", 1, 86_400) {
        settings.graph.staleness_ttl_secs = v;
    }

    // ── Inference server ────────────────────────────────────────────
    if let Some(v) = string("OLLAMA_HOST") {
        settings.llm.host = v;
    }
    if let Some(v) = string("OLLAMA_MODEL") {
        settings.llm.model = v;
    }
    if let Some(v) = int_u32("HARVEST_PROBE_MAX_ATTEMPTS", 1, 100) {
        settings.llm.probe_retry.max_attempts = v;
    }
    if let Some(v) = int_u64("HARVEST_PROBE_RETRY_DELAY_MS", 0, 600_000) {
        settings.llm.probe_retry.delay_ms = v;
    }
    if let Some(v) = int_u32("HARVEST_GENERATE_MAX_ATTEMPTS", 1, 100) {
        settings.llm.generate_retry.max_attempts = v;
    }
    if let Some(v) = int_u64("HARVEST_GENERATE_RETRY_DELAY_MS", 0, 600_000) {
        settings.llm.generate_retry.delay_ms = v;
    }
    if let Some(v) = int_u64("HARVEST_GENERATE_TIMEOUT_SECS", 1, 3_600) {
        settings.llm.generate_timeout_secs = v;
    }
    if let Some(v) = int_u64("HARVEST_PROBE_TIMEOUT_SECS", 1, 600) {
        settings.llm.probe_timeout_secs = v;
    }
    if let Some(v) = int_u64("HARVEST_PULL_TIMEOUT_SECS", 1, 86_400) {
        settings.llm.pull_timeout_secs = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a u32 within `[min, max]`.
#[must_use]
pub fn parse_u32(val: &str, min: u32, max: u32) -> Option<u32> {
    val.trim()
        .parse::<u32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

/// Parse a string as a u64 within `[min, max]`.
#[must_use]
pub fn parse_u64(val: &str, min: u64, max: u64) -> Option<u64> {
    val.trim()
        .parse::<u64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
