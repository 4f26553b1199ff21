//! In-memory plant store.
//!
//! Deliberately non-durable: records live for the process lifetime
//! only. Ids are assigned from a monotonically increasing counter and
//! never reused.

use harvest_core::Plant;
use parking_lot::Mutex;

/// Memory-resident plant records.
pub struct PlantStore {
    inner: Mutex<Inner>,
}

struct Inner {
    plants: Vec<Plant>,
    next_id: u64,
}

impl PlantStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                plants: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Insert a plant, assigning it the next id. Returns the stored
    /// record.
    pub fn insert(&self, mut plant: Plant) -> Plant {
        let mut inner = self.inner.lock();
        plant.id = Some(inner.next_id);
        inner.next_id += 1;
        inner.plants.push(plant.clone());
        plant
    }

    /// Look up a plant by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<Plant> {
        self.inner
            .lock()
            .plants
            .iter()
            .find(|p| p.id == Some(id))
            .cloned()
    }

    /// Remove a plant by id, returning it if present.
    pub fn remove(&self, id: u64) -> Option<Plant> {
        let mut inner = self.inner.lock();
        let pos = inner.plants.iter().position(|p| p.id == Some(id))?;
        Some(inner.plants.remove(pos))
    }

    /// All plants in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<Plant> {
        self.inner.lock().plants.clone()
    }
}

impl Default for PlantStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn plant(name: &str) -> Plant {
        Plant {
            id: None,
            name: name.into(),
            species: "test".into(),
            date_planted: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            location: "bed".into(),
            harvest_info: None,
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let store = PlantStore::new();
        assert_eq!(store.insert(plant("a")).id, Some(1));
        assert_eq!(store.insert(plant("b")).id, Some(2));
    }

    #[test]
    fn ids_are_never_reused_after_removal() {
        let store = PlantStore::new();
        let first = store.insert(plant("a"));
        assert!(store.remove(first.id.unwrap()).is_some());
        assert_eq!(store.insert(plant("b")).id, Some(2));
    }

    #[test]
    fn get_and_remove_missing_return_none() {
        let store = PlantStore::new();
        assert!(store.get(7).is_none());
        assert!(store.remove(7).is_none());
    }

    #[test]
    fn list_preserves_insertion_order() {
        let store = PlantStore::new();
        let _ = store.insert(plant("a"));
        let _ = store.insert(plant("b"));
        let names: Vec<_> = store.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
