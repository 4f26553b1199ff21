//! Domain records.
//!
//! [`Plant`] is the memory-resident journal entry; [`Interaction`] is
//! the append-only audit record persisted to the graph store. Audit
//! records are write-once: created after a successful mutation, listed
//! newest-first, never updated or deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A plant tracked by the journal.
///
/// `id` is assigned by the store on insert; `harvest_info` is filled
/// from the inference client (real or fallback text — always present
/// after a successful add).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    /// Store-assigned identifier. `None` until inserted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Display name (e.g. "Cherry tomato").
    pub name: String,
    /// Botanical or variety name.
    pub species: String,
    /// Date the plant went into the ground.
    pub date_planted: NaiveDate,
    /// Where the plant lives (bed, pot, greenhouse...).
    pub location: String,
    /// Derived harvest guidance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_info: Option<String>,
}

/// Append-only audit record pairing a triggering action with its
/// derived textual result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Description of the action that triggered the record.
    pub user_input: String,
    /// Text the inference client produced for that action.
    pub llm_response: String,
    /// Creation time, assigned when the record is written.
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(user_input: impl Into<String>, llm_response: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            llm_response: llm_response.into(),
            created_at: Utc::now(),
        }
    }
}
