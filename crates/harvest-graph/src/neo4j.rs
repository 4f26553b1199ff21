//! Production bolt driver backed by `neo4rs`.
//!
//! Issues the three fixed queries this system needs: the `RETURN 1`
//! liveness probe, the parameterized interaction CREATE, and the
//! newest-first interaction listing. Record timestamps are generated
//! client-side as RFC3339 strings; the listing orders on that property
//! (RFC3339 sorts lexicographically in timestamp order).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harvest_core::Interaction;
use harvest_settings::GraphSettings;
use neo4rs::{query, Graph};
use tracing::{debug, warn};

use crate::driver::{BoltDriver, BoltSession};
use crate::error::GraphError;

const PROBE_QUERY: &str = "RETURN 1 AS num";

const CREATE_QUERY: &str = "CREATE (i:Interaction { \
     user_input: $user_input, \
     llm_response: $llm_response, \
     created_at: $created_at \
     })";

const LIST_QUERY: &str = "MATCH (i:Interaction) \
     RETURN i.user_input AS user_input, \
            i.llm_response AS llm_response, \
            i.created_at AS created_at \
     ORDER BY i.created_at DESC";

/// Bolt driver opening `neo4rs` sessions from configured credentials.
pub struct Neo4jDriver {
    settings: GraphSettings,
}

impl Neo4jDriver {
    /// Create a driver for the configured endpoint.
    #[must_use]
    pub fn new(settings: GraphSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BoltDriver for Neo4jDriver {
    async fn connect(&self) -> Result<Arc<dyn BoltSession>, GraphError> {
        let graph = Graph::new(
            &self.settings.uri,
            &self.settings.user,
            &self.settings.password,
        )
        .await
        .map_err(map_driver_err)?;
        Ok(Arc::new(Neo4jSession { graph }))
    }
}

struct Neo4jSession {
    graph: Graph,
}

#[async_trait]
impl BoltSession for Neo4jSession {
    async fn probe(&self) -> Result<(), GraphError> {
        let mut rows = self
            .graph
            .execute(query(PROBE_QUERY))
            .await
            .map_err(map_driver_err)?;
        let row = rows
            .next()
            .await
            .map_err(map_driver_err)?
            .ok_or_else(|| GraphError::Backend {
                detail: "probe query returned no rows".into(),
            })?;
        if row.get::<i64>("num").ok() != Some(1) {
            return Err(GraphError::Backend {
                detail: "probe query returned unexpected value".into(),
            });
        }
        Ok(())
    }

    async fn create_interaction(&self, record: &Interaction) -> Result<(), GraphError> {
        let q = query(CREATE_QUERY)
            .param("user_input", record.user_input.as_str())
            .param("llm_response", record.llm_response.as_str())
            .param("created_at", record.created_at.to_rfc3339());
        self.graph.run(q).await.map_err(map_driver_err)
    }

    async fn list_interactions(&self) -> Result<Vec<Interaction>, GraphError> {
        let mut rows = self
            .graph
            .execute(query(LIST_QUERY))
            .await
            .map_err(map_driver_err)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await.map_err(map_driver_err)? {
            match parse_row(&row) {
                Some(record) => records.push(record),
                None => warn!("skipping interaction row with missing or malformed fields"),
            }
        }
        Ok(records)
    }

    async fn close(&self) -> Result<(), GraphError> {
        // neo4rs releases its pool on drop; nothing explicit to do.
        debug!("releasing bolt session");
        Ok(())
    }
}

fn parse_row(row: &neo4rs::Row) -> Option<Interaction> {
    let user_input: String = row.get("user_input").ok()?;
    let llm_response: String = row.get("llm_response").ok()?;
    let created_at_raw: String = row.get("created_at").ok()?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .ok()?
        .with_timezone(&Utc);
    Some(Interaction {
        user_input,
        llm_response,
        created_at,
    })
}

/// Map driver errors onto the retry taxonomy.
///
/// Connection and IO failures are transient; authentication rejection
/// is kept retryable to match the store's observed warm-up behavior.
fn map_driver_err(err: neo4rs::Error) -> GraphError {
    match err {
        neo4rs::Error::AuthenticationError(detail) => GraphError::AuthRejected { detail },
        neo4rs::Error::ConnectionError => GraphError::Unavailable {
            detail: "connection error".into(),
        },
        neo4rs::Error::IOError { detail } => GraphError::Unavailable {
            detail: detail.to_string(),
        },
        other => GraphError::Backend {
            detail: other.to_string(),
        },
    }
}
