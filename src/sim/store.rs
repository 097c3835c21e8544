//! Entity store: the canonical simulation state
//!
//! Entities are kept sorted by id so every pass iterates in a stable order.

use super::entity::{ComponentPatch, Components, Entity, EntityId};
use crate::SimError;

/// Flat collection of entities
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
    /// Highest id ever issued, so removed ids are never handed out again
    highest_id: EntityId,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity and return its id (`max(existing ids) + 1`)
    pub fn add_entity(&mut self, components: Components) -> EntityId {
        let max_existing = self.entities.iter().map(|e| e.id).max().unwrap_or(0);
        let id = max_existing.max(self.highest_id) + 1;
        self.highest_id = id;
        log::info!(
            "Added entity {} ({})",
            id,
            components.name.as_deref().unwrap_or("unnamed")
        );
        self.entities.push(Entity::new(id, components));
        id
    }

    /// Merge `patch` into the entity with the given id
    pub fn update_entity(&mut self, id: EntityId, patch: ComponentPatch) -> Result<(), SimError> {
        let entity = self
            .get_mut(id)
            .ok_or(SimError::UnknownEntity { id })?;
        entity.apply(patch);
        log::debug!("Updated entity {}", id);
        Ok(())
    }

    /// Remove every entity matching `predicate`, returning how many were removed
    pub fn remove_entities<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Entity) -> bool,
    {
        let before = self.entities.len();
        self.entities.retain(|e| !predicate(e));
        let removed = before - self.entities.len();
        if removed > 0 {
            log::info!("Removed {} entities", removed);
        }
        removed
    }

    /// Reset every non-persistent entity to its creation-time motion
    pub fn reset_non_persistent(&mut self) {
        for entity in self.entities.iter_mut().filter(|e| !e.persistent) {
            entity.reset_motion();
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Smallest x over positioned entities
    pub fn min_entity_x(&self) -> Option<f64> {
        self.positions().map(|p| p.x).reduce(f64::min)
    }

    /// Largest x over positioned entities
    pub fn max_entity_x(&self) -> Option<f64> {
        self.positions().map(|p| p.x).reduce(f64::max)
    }

    /// Smallest y over positioned entities
    pub fn min_entity_y(&self) -> Option<f64> {
        self.positions().map(|p| p.y).reduce(f64::min)
    }

    /// Largest y over positioned entities
    pub fn max_entity_y(&self) -> Option<f64> {
        self.positions().map(|p| p.y).reduce(f64::max)
    }

    fn positions(&self) -> impl Iterator<Item = glam::DVec2> + '_ {
        self.entities.iter().filter_map(|e| e.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Patch;
    use glam::DVec2;

    #[test]
    fn test_ids_are_max_plus_one() {
        let mut store = EntityStore::new();
        assert_eq!(store.add_entity(Components::new()), 1);
        assert_eq!(store.add_entity(Components::new()), 2);
        assert_eq!(store.add_entity(Components::new()), 3);
    }

    #[test]
    fn test_removed_ids_are_not_reused() {
        let mut store = EntityStore::new();
        store.add_entity(Components::new());
        let second = store.add_entity(Components::new());
        assert_eq!(store.remove_entities(|e| e.id == second), 1);

        let third = store.add_entity(Components::new());
        assert_eq!(third, 3);
    }

    #[test]
    fn test_update_unknown_entity_is_an_error() {
        let mut store = EntityStore::new();
        let result = store.update_entity(42, ComponentPatch::default());
        assert!(matches!(result, Err(SimError::UnknownEntity { id: 42 })));
    }

    #[test]
    fn test_update_merges_components() {
        let mut store = EntityStore::new();
        let id = store.add_entity(Components::new().with_position(0.0, 1.0).with_mass(0.6));
        store
            .update_entity(
                id,
                ComponentPatch {
                    velocity: Patch::Set(DVec2::new(1.0, 0.0)),
                    ..Default::default()
                },
            )
            .unwrap();

        let entity = store.get(id).unwrap();
        assert_eq!(entity.velocity, Some(DVec2::new(1.0, 0.0)));
        assert_eq!(entity.mass, Some(0.6));
    }

    #[test]
    fn test_reset_skips_persistent_entities() {
        let mut store = EntityStore::new();
        let moving = store.add_entity(Components::new().with_position(0.0, 1.0).with_velocity(1.0, 0.0));
        let pinned = store.add_entity(
            Components::new()
                .with_position(5.0, 5.0)
                .with_velocity(0.0, 1.0)
                .persistent(),
        );

        for entity in store.iter_mut() {
            entity.position = Some(DVec2::new(9.0, 9.0));
            entity.velocity = Some(DVec2::ZERO);
        }
        store.reset_non_persistent();

        let moving = store.get(moving).unwrap();
        assert_eq!(moving.position, Some(DVec2::new(0.0, 1.0)));
        assert_eq!(moving.velocity, Some(DVec2::new(1.0, 0.0)));
        let pinned = store.get(pinned).unwrap();
        assert_eq!(pinned.position, Some(DVec2::new(9.0, 9.0)));
        assert_eq!(pinned.velocity, Some(DVec2::ZERO));
    }

    #[test]
    fn test_extrema_ignore_unpositioned_entities() {
        let mut store = EntityStore::new();
        assert_eq!(store.max_entity_y(), None);

        store.add_entity(Components::new().with_position(-2.0, 3.0));
        store.add_entity(Components::new().with_position(4.0, 1.0));
        store.add_entity(Components::new().with_mass(1.0));

        assert_eq!(store.min_entity_x(), Some(-2.0));
        assert_eq!(store.max_entity_x(), Some(4.0));
        assert_eq!(store.min_entity_y(), Some(1.0));
        assert_eq!(store.max_entity_y(), Some(3.0));
    }
}
