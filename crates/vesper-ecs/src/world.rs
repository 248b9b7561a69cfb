use std::any::TypeId;
use std::collections::HashMap;

use crate::component::{Component, ComponentStore, SparseSet};
use crate::entity::{Entity, EntityAllocator};
use crate::error::EcsError;
use crate::query::{QueryIter, QueryParam};
use crate::resource::Resources;

/// The central ECS container: owns entity identity, per-type component
/// storage, and singleton resources, and answers queries.
///
/// A `World` belongs to exactly one engine instance; entity handles are only
/// meaningful within the `World` that issued them.
pub struct World {
    entities: EntityAllocator,
    stores: HashMap<TypeId, Box<dyn ComponentStore>>,
    resources: Resources,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            stores: HashMap::new(),
            resources: Resources::new(),
        }
    }

    // ---- Entities ----

    /// Create a new entity with no components. Never fails.
    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Destroy an entity, removing every component attached to it in the
    /// same call. Despawning a stale or unknown handle is a no-op returning
    /// `false`, so systems may despawn speculatively without coordination.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }
        for store in self.stores.values_mut() {
            store.remove(entity.index);
        }
        true
    }

    /// Whether the handle refers to a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ---- Components ----

    fn store_mut<T: Component>(&mut self) -> &mut SparseSet<T> {
        self.stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(SparseSet::<T>::new()))
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()
            .expect("component store type mismatch")
    }

    fn store<T: Component>(&self) -> Option<&SparseSet<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<SparseSet<T>>())
    }

    /// Attach a component, replacing any existing component of the same type
    /// on that entity (the previous value is dropped). The entity must be
    /// alive.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), EcsError> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        self.store_mut::<T>().insert(entity.index, component);
        Ok(())
    }

    /// Read a component. Absent for a dead entity or an unattached type;
    /// never an error.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.store::<T>()?.get(entity.index)
    }

    /// Mutably borrow a component. Borrows must not be cached across frames;
    /// storage may move values on structural changes.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.store_mut::<T>().get_mut(entity.index)
    }

    /// Detach a component if present. Absent component or dead entity is a
    /// no-op returning `false`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        match self.stores.get_mut(&TypeId::of::<T>()) {
            Some(store) => store.remove(entity.index),
            None => false,
        }
    }

    /// Whether the entity carries a component of this type.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        self.store::<T>().map_or(false, |s| s.has(entity.index))
    }

    // ---- Queries ----

    /// Find every entity carrying all of the query's required components.
    ///
    /// Candidates come from the smallest required type's dense index, so the
    /// cost scales with the rarest component, not the entity count. Results
    /// follow that index's insertion order, stable between structural
    /// mutations of this `World`.
    ///
    /// ```ignore
    /// for (entity, (transform, velocity)) in world.query::<(&Transform, &mut Velocity)>() {
    ///     // ...
    /// }
    /// ```
    pub fn query<Q: QueryParam>(&self) -> QueryIter<'_, Q> {
        let required = Q::required_type_ids();

        let candidates = if required.is_empty() {
            // All-optional query: walk every live entity.
            self.entities.live_indices().collect()
        } else {
            let mut smallest: Option<&dyn ComponentStore> = None;
            for tid in &required {
                match self.stores.get(tid) {
                    Some(store) => {
                        if smallest.map_or(true, |s| store.len() < s.len()) {
                            smallest = Some(store.as_ref());
                        }
                    }
                    // A required type was never stored: nothing can match.
                    None => return QueryIter::new(&self.entities, &self.stores, Vec::new()),
                }
            }
            smallest.map_or_else(Vec::new, |s| s.dense_entities().to_vec())
        };

        QueryIter::new(&self.entities, &self.stores, candidates)
    }

    // ---- Resources ----

    /// Insert a singleton resource, replacing any previous value of the type.
    pub fn insert_resource<T: 'static + Send + Sync>(&mut self, value: T) {
        self.resources.insert(value);
    }

    pub fn resource<T: 'static + Send + Sync>(&self) -> Option<&T> {
        self.resources.get::<T>()
    }

    pub fn resource_mut<T: 'static + Send + Sync>(&mut self) -> Option<&mut T> {
        self.resources.get_mut::<T>()
    }

    pub fn remove_resource<T: 'static + Send + Sync>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
