//! Startup availability probe.
//!
//! Runs once, when the client is constructed:
//!
//! 1. `GET /` — liveness
//! 2. `GET /api/tags` — is the target model resident?
//! 3. `POST /api/pull` — load it if not (slow; can run for minutes)
//!
//! Every step runs under the probe retry policy, which is deliberately
//! more generous than the generation budget: at system startup the
//! inference server (a sibling container) is often still coming up.
//! A probe that ultimately fails is never fatal — the process starts
//! anyway and generation degrades to its fallback text.

use std::time::Duration;

use harvest_core::run_with_retry;
use harvest_settings::LlmSettings;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::LlmError;

/// Cached result of the one-time availability probe.
///
/// `checked` is false when the server could not be reached at all;
/// `present` is whether the target model was resident (or successfully
/// pulled). Never re-checked after construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelAvailability {
    /// Whether the server answered the liveness and listing probes.
    pub checked: bool,
    /// Whether the target model is resident.
    pub present: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Check the server and make sure the target model is resident,
/// pulling it if necessary. Total: failures degrade, never propagate.
pub async fn ensure_model_available(
    http: &reqwest::Client,
    settings: &LlmSettings,
) -> ModelAvailability {
    let base = settings.base_url();
    let probe_timeout = Duration::from_secs(settings.probe_timeout_secs);

    info!(url = %base, "checking inference server availability");
    let listing = run_with_retry(&settings.probe_retry, "llm.probe", || {
        let http = http.clone();
        let base = base.clone();
        async move {
            let liveness = http
                .get(format!("{base}/"))
                .timeout(probe_timeout)
                .send()
                .await?;
            let _ = liveness.error_for_status()?;

            let tags = http
                .get(format!("{base}/api/tags"))
                .timeout(probe_timeout)
                .send()
                .await?
                .error_for_status()?;
            let tags: TagsResponse = tags.json().await?;
            Ok::<_, LlmError>(tags)
        }
    })
    .await;

    let tags = match listing {
        Ok(tags) => tags,
        Err(err) => {
            warn!(
                error = %err,
                "could not verify inference server availability, continuing without model"
            );
            return ModelAvailability {
                checked: false,
                present: false,
            };
        }
    };

    if tags
        .models
        .iter()
        .any(|m| matches_model(&m.name, &settings.model))
    {
        info!(model = %settings.model, "model is already resident");
        return ModelAvailability {
            checked: true,
            present: true,
        };
    }

    info!(model = %settings.model, "model not resident, pulling now (may take minutes)");
    let pull_timeout = Duration::from_secs(settings.pull_timeout_secs);
    let pulled = run_with_retry(&settings.probe_retry, "llm.pull", || {
        let http = http.clone();
        let base = base.clone();
        async move {
            let response = http
                .post(format!("{base}/api/pull"))
                .timeout(pull_timeout)
                .json(&serde_json::json!({ "name": settings.model }))
                .send()
                .await?;
            let _ = response.error_for_status()?;
            Ok::<_, LlmError>(())
        }
    })
    .await;

    match pulled {
        Ok(()) => {
            info!(model = %settings.model, "model pulled successfully");
            ModelAvailability {
                checked: true,
                present: true,
            }
        }
        Err(err) => {
            // Absence is deferred to query time, where generation falls
            // back to its fixed response.
            warn!(
                model = %settings.model,
                error = %err,
                "failed to pull model, continuing without it"
            );
            ModelAvailability {
                checked: true,
                present: false,
            }
        }
    }
}

/// Whether a listed tag matches the target model.
///
/// Tags are reported with a variant suffix (`llama3.2:latest`); accept
/// either the exact name or any variant of it.
fn matches_model(tag: &str, target: &str) -> bool {
    tag == target || tag.split(':').next() == Some(target)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
