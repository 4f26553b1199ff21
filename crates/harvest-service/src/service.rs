//! Plant journal operations.
//!
//! Every successful mutation is mirrored as a best-effort audit record
//! in the graph store; the derived harvest guidance comes from the
//! inference client and is always present (real or fallback text).

use std::sync::Arc;

use chrono::NaiveDate;
use harvest_core::{Interaction, Plant};
use harvest_graph::ConnectionManager;
use harvest_llm::TextGenerator;
use tracing::info;

use crate::error::ServiceError;
use crate::resilient::with_audit;
use crate::store::PlantStore;

/// Input for registering a plant.
#[derive(Clone, Debug)]
pub struct NewPlant {
    /// Display name.
    pub name: String,
    /// Botanical or variety name.
    pub species: String,
    /// Date the plant went into the ground.
    pub date_planted: NaiveDate,
    /// Where the plant lives.
    pub location: String,
}

/// Domain operations over the store and the two external clients.
pub struct PlantService {
    store: PlantStore,
    generator: Arc<dyn TextGenerator>,
    graph: Arc<ConnectionManager>,
}

impl PlantService {
    /// Create the service. Clients are constructed at process start and
    /// injected; the service owns only the in-memory store.
    pub fn new(generator: Arc<dyn TextGenerator>, graph: Arc<ConnectionManager>) -> Self {
        Self {
            store: PlantStore::new(),
            generator,
            graph,
        }
    }

    /// Register a plant: derive harvest guidance, store the record,
    /// then best-effort audit the addition.
    pub async fn add_plant(&self, new: NewPlant) -> Result<Plant, ServiceError> {
        info!(name = %new.name, "adding plant");
        let prompt = harvest_prompt(&new);
        let harvest_info = self.generator.generate(&prompt).await;

        let plant = self.store.insert(Plant {
            id: None,
            name: new.name,
            species: new.species,
            date_planted: new.date_planted,
            location: new.location,
            harvest_info: Some(harvest_info),
        });

        with_audit(Ok(plant), |plant: &Plant| {
            let user_input = format!("Add plant: {}", plant.name);
            let response = plant.harvest_info.clone().unwrap_or_default();
            async move { self.graph.write_audit(&user_input, &response).await }
        })
        .await
    }

    /// Look up a plant by id.
    pub fn get_plant(&self, id: u64) -> Result<Plant, ServiceError> {
        self.store.get(id).ok_or(ServiceError::NotFound(id))
    }

    /// All plants in insertion order.
    #[must_use]
    pub fn list_plants(&self) -> Vec<Plant> {
        self.store.list()
    }

    /// Remove a plant, returning it, then best-effort audit the
    /// deletion. The audit is not attempted when the plant is missing.
    pub async fn delete_plant(&self, id: u64) -> Result<Plant, ServiceError> {
        let primary = self.store.remove(id).ok_or(ServiceError::NotFound(id));
        with_audit(primary, |plant: &Plant| {
            let user_input = format!("Delete plant: {}", plant.name);
            let response = format!("Successfully deleted plant with ID {id}");
            async move { self.graph.write_audit(&user_input, &response).await }
        })
        .await
    }

    /// All audit records, newest first. Graph failures propagate here:
    /// there is no degraded mode for reading the audit log.
    pub async fn list_interactions(&self) -> Result<Vec<Interaction>, ServiceError> {
        Ok(self.graph.list_audits().await?)
    }
}

/// Prompt asking the model for harvest guidance on one plant.
fn harvest_prompt(plant: &NewPlant) -> String {
    format!(
        "Given the following plant information:\n\
         Name: {name}\n\
         Species: {species}\n\
         Date Planted: {date_planted}\n\
         Location: {location}\n\
         \n\
         Please analyze this information and provide:\n\
         1. Estimated harvest time based on the planting date and typical growth cycle\n\
         2. Specific signs to look for to determine if the plant is ready for harvest\n\
         3. Any location-specific considerations that might affect the harvest timing\n\
         4. Best practices for harvesting this specific plant\n\
         \n\
         Format your response in a clear, structured way with these sections.",
        name = plant.name,
        species = plant.species,
        date_planted = plant.date_planted,
        location = plant.location,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use harvest_core::RetryPolicy;
    use harvest_graph::{BoltDriver, BoltSession, GraphError};
    use parking_lot::Mutex;
    use std::time::Duration;

    struct CannedGenerator {
        text: String,
        last_prompt: Mutex<Option<String>>,
    }

    impl CannedGenerator {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.into(),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> String {
            *self.last_prompt.lock() = Some(prompt.to_string());
            self.text.clone()
        }
    }

    #[derive(Default)]
    struct FakeGraph {
        records: Mutex<Vec<Interaction>>,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    struct FakeGraphDriver(Arc<FakeGraph>);

    #[async_trait]
    impl BoltDriver for FakeGraphDriver {
        async fn connect(&self) -> Result<Arc<dyn BoltSession>, GraphError> {
            Ok(Arc::new(FakeGraphSession(Arc::clone(&self.0))) as Arc<dyn BoltSession>)
        }
    }

    struct FakeGraphSession(Arc<FakeGraph>);

    #[async_trait]
    impl BoltSession for FakeGraphSession {
        async fn probe(&self) -> Result<(), GraphError> {
            Ok(())
        }

        async fn create_interaction(&self, record: &Interaction) -> Result<(), GraphError> {
            if self.0.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(GraphError::Unavailable {
                    detail: "store is down".into(),
                });
            }
            self.0.records.lock().push(record.clone());
            Ok(())
        }

        async fn list_interactions(&self) -> Result<Vec<Interaction>, GraphError> {
            let mut records = self.0.records.lock().clone();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(records)
        }

        async fn close(&self) -> Result<(), GraphError> {
            Ok(())
        }
    }

    fn service_with(
        generator: Arc<CannedGenerator>,
    ) -> (PlantService, Arc<FakeGraph>) {
        let graph_state = Arc::new(FakeGraph::default());
        let manager = Arc::new(ConnectionManager::new(
            Arc::new(FakeGraphDriver(Arc::clone(&graph_state))),
            RetryPolicy::new(1, 0),
            Duration::from_secs(300),
        ));
        (PlantService::new(generator, manager), graph_state)
    }

    fn tomato() -> NewPlant {
        NewPlant {
            name: "Cherry tomato".into(),
            species: "Solanum lycopersicum".into(),
            date_planted: NaiveDate::from_ymd_opt(2025, 4, 12).unwrap(),
            location: "bed 2".into(),
        }
    }

    #[tokio::test]
    async fn add_plant_stores_generated_guidance_and_audits() {
        let generator = CannedGenerator::new("ready in roughly 70 days");
        let (service, graph) = service_with(Arc::clone(&generator));

        let plant = service.add_plant(tomato()).await.unwrap();
        assert_eq!(plant.id, Some(1));
        assert_eq!(plant.harvest_info.as_deref(), Some("ready in roughly 70 days"));

        let prompt = generator.last_prompt.lock().clone().unwrap();
        assert!(prompt.contains("Cherry tomato"));
        assert!(prompt.contains("Solanum lycopersicum"));

        let records = graph.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_input, "Add plant: Cherry tomato");
        assert_eq!(records[0].llm_response, "ready in roughly 70 days");
    }

    #[tokio::test]
    async fn add_plant_succeeds_when_audit_write_fails() {
        let (service, graph) = service_with(CannedGenerator::new("soon"));
        graph
            .fail_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let plant = service.add_plant(tomato()).await.unwrap();
        assert_eq!(plant.harvest_info.as_deref(), Some("soon"));
        assert!(graph.records.lock().is_empty());
    }

    #[tokio::test]
    async fn delete_plant_removes_and_audits() {
        let (service, graph) = service_with(CannedGenerator::new("soon"));
        let plant = service.add_plant(tomato()).await.unwrap();

        let deleted = service.delete_plant(plant.id.unwrap()).await.unwrap();
        assert_eq!(deleted.name, "Cherry tomato");
        assert!(service.list_plants().is_empty());

        let records = graph.records.lock();
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .any(|r| r.user_input == "Delete plant: Cherry tomato"
                && r.llm_response == "Successfully deleted plant with ID 1"));
    }

    #[tokio::test]
    async fn delete_missing_plant_is_not_found_and_not_audited() {
        let (service, graph) = service_with(CannedGenerator::new("soon"));

        let result = service.delete_plant(42).await;
        assert_matches!(result, Err(ServiceError::NotFound(42)));
        assert!(graph.records.lock().is_empty());
    }

    #[tokio::test]
    async fn get_plant_returns_stored_record() {
        let (service, _) = service_with(CannedGenerator::new("soon"));
        let plant = service.add_plant(tomato()).await.unwrap();

        let found = service.get_plant(plant.id.unwrap()).unwrap();
        assert_eq!(found, plant);
        assert_matches!(service.get_plant(99), Err(ServiceError::NotFound(99)));
    }

    #[tokio::test]
    async fn list_interactions_returns_newest_first() {
        let (service, _) = service_with(CannedGenerator::new("soon"));
        let first = service.add_plant(tomato()).await.unwrap();
        let _ = service.delete_plant(first.id.unwrap()).await.unwrap();

        let records = service.list_interactions().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].created_at >= records[1].created_at);
    }
}
