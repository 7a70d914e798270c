//! The component store: sole owner of every component instance.
//!
//! [`ComponentStore`] holds the entity allocator, the set of live entities,
//! and one [`Column`] per registered component type. Columns are indexed by
//! the dense [`ComponentTypeId`] the registry assigns, so a typed lookup costs
//! one `TypeId` hash and then a vector index.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::column::{Column, ErasedColumn};
use crate::component::{Component, ComponentPolicy, ComponentRegistry, ComponentTypeId};
use crate::entity::{Entity, EntityAllocator};
use crate::error::EcsError;

/// Bookkeeping for one live entity.
#[derive(Debug, Default)]
struct EntityRecord {
    /// Distinct component types the entity currently owns.
    types: Vec<ComponentTypeId>,
}

/// Owns all entities and component instances.
pub struct ComponentStore {
    policy: ComponentPolicy,
    allocator: EntityAllocator,
    entities: HashMap<Entity, EntityRecord>,
    registry: ComponentRegistry,
    pub(crate) columns: Vec<Box<dyn ErasedColumn>>,
}

impl ComponentStore {
    /// Create an empty store with the multi-instance policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(ComponentPolicy::default())
    }

    /// Create an empty store with an explicit per-entity cardinality policy.
    #[must_use]
    pub fn with_policy(policy: ComponentPolicy) -> Self {
        Self {
            policy,
            allocator: EntityAllocator::new(),
            entities: HashMap::new(),
            registry: ComponentRegistry::new(),
            columns: Vec::new(),
        }
    }

    /// The cardinality policy this store was built with.
    #[must_use]
    pub fn policy(&self) -> ComponentPolicy {
        self.policy
    }

    /// The component type registry.
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- Entity lifecycle --

    /// Allocate a fresh entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.insert(entity, EntityRecord::default());
        entity
    }

    /// Returns `true` if `entity` was created by this store and not yet removed.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All live entities in creation order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        let mut all: Vec<Entity> = self.entities.keys().copied().collect();
        all.sort();
        all
    }

    /// Remove an entity and every component it owns.
    ///
    /// Components are dropped from every type column before the identity is
    /// released. Returns the number of component instances removed.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not alive.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<usize, EcsError> {
        let record = self.entities.get(&entity).ok_or_else(|| {
            let previously_allocated = self.allocator.has_allocated(entity);
            warn!(%entity, previously_allocated, "remove_entity on an entity that is not alive");
            EcsError::EntityNotFound(entity)
        })?;

        let mut removed = 0;
        for id in record.types.clone() {
            let column = &mut self.columns[id.index()];
            debug_assert_eq!(column.component_id(), id);
            removed += column.remove_entity(entity);
        }
        self.entities.remove(&entity);

        debug!(%entity, removed, "entity removed");
        Ok(removed)
    }

    // -- Component registration --

    /// Register `T` and return its dense type id.
    ///
    /// Adding a component registers its type implicitly; registering up front
    /// only fixes the id order.
    pub fn register_component<T: Component>(&mut self) -> ComponentTypeId {
        let (id, fresh) = self.registry.register::<T>();
        if fresh {
            self.columns.push(Box::new(Column::<T>::new(id)));
            debug!(component = T::type_name(), id = id.0, "component type registered");
        }
        id
    }

    /// The type id of `T`, if any instance has ever been stored.
    #[must_use]
    pub fn component_type_id<T: Component>(&self) -> Option<ComponentTypeId> {
        self.registry.id_of::<T>()
    }

    /// Typed access to the column for `T`.
    #[must_use]
    pub fn column<T: Component>(&self) -> Option<&Column<T>> {
        let id = self.registry.id_of::<T>()?;
        self.columns[id.index()].as_any().downcast_ref::<Column<T>>()
    }

    /// Mutable typed access to the column for `T`.
    #[must_use]
    pub fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        let id = self.registry.id_of::<T>()?;
        self.columns[id.index()]
            .as_any_mut()
            .downcast_mut::<Column<T>>()
    }

    // -- Component operations --

    /// Attach a component to a live entity and return a reference to it.
    ///
    /// The reference is valid until the next structural change to the store.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityNotFound`] if the entity is not alive.
    /// - [`EcsError::DuplicateComponent`] under [`ComponentPolicy::Single`]
    ///   when the entity already holds a `T`. The store is left unchanged.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<&mut T, EcsError> {
        if !self.is_alive(entity) {
            warn!(%entity, component = T::type_name(), "add_component on an entity that is not alive");
            return Err(EcsError::EntityNotFound(entity));
        }

        let id = self.register_component::<T>();

        if self.policy == ComponentPolicy::Single && self.has_component::<T>(entity) {
            warn!(%entity, component = T::type_name(), "duplicate component rejected");
            return Err(EcsError::DuplicateComponent {
                entity,
                component: T::type_name(),
            });
        }

        if let Some(record) = self.entities.get_mut(&entity)
            && !record.types.contains(&id)
        {
            record.types.push(id);
        }

        let column = self.columns[id.index()]
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .expect("column type matches its registered id");
        Ok(column.push(entity, component))
    }

    /// Remove every `T` owned by `entity` and return them, oldest first.
    ///
    /// Absent components are a no-op returning an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not alive.
    pub fn take_components<T: Component>(&mut self, entity: Entity) -> Result<Vec<T>, EcsError> {
        if !self.is_alive(entity) {
            warn!(%entity, component = T::type_name(), "remove_component on an entity that is not alive");
            return Err(EcsError::EntityNotFound(entity));
        }

        let Some(id) = self.registry.id_of::<T>() else {
            return Ok(Vec::new());
        };
        let taken = self.column_mut::<T>().map(|c| c.take(entity)).unwrap_or_default();

        if !taken.is_empty()
            && let Some(record) = self.entities.get_mut(&entity)
        {
            record.types.retain(|&t| t != id);
        }
        Ok(taken)
    }

    /// Remove every `T` owned by `entity`. Returns how many were removed.
    ///
    /// Calling this when the entity holds no `T` is a no-op returning `0`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not alive.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<usize, EcsError> {
        self.take_components::<T>(entity).map(|taken| taken.len())
    }

    /// All live instances of `T`, in column order.
    pub fn get_components<T: Component>(&self) -> impl Iterator<Item = &T> + '_ {
        self.column::<T>()
            .into_iter()
            .flat_map(|column| column.values().iter())
    }

    /// Mutable access to all live instances of `T`, in column order.
    pub fn get_components_mut<T: Component>(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.column_mut::<T>()
            .into_iter()
            .flat_map(|column| column.values_mut().iter_mut())
    }

    /// All live `(owner, instance)` pairs of `T`, in column order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.column::<T>().into_iter().flat_map(|column| column.iter())
    }

    /// Mutable `(owner, instance)` pairs of `T`, in column order.
    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.column_mut::<T>().into_iter().flat_map(|column| column.iter_mut())
    }

    /// The oldest `T` owned by `entity`.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.column::<T>()?.get(entity)
    }

    /// Mutable access to the oldest `T` owned by `entity`.
    #[must_use]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.column_mut::<T>()?.get_mut(entity)
    }

    /// Every `T` owned by `entity`, oldest first.
    #[must_use]
    pub fn get_components_of<T: Component>(&self, entity: Entity) -> Vec<&T> {
        self.column::<T>()
            .map(|column| column.get_all(entity))
            .unwrap_or_default()
    }

    /// Like [`get_component`](Self::get_component), but the absence is an error.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] for a dead entity,
    /// [`EcsError::ComponentNotFound`] when it holds no `T`.
    pub fn require_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::EntityNotFound(entity));
        }
        self.get_component::<T>(entity)
            .ok_or(EcsError::ComponentNotFound {
                entity,
                component: T::type_name(),
            })
    }

    /// Returns `true` if `entity` holds at least one `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.column::<T>().is_some_and(|column| column.contains(entity))
    }

    /// Number of live `T` instances across all entities.
    #[must_use]
    pub fn component_count<T: Component>(&self) -> usize {
        self.column::<T>().map_or(0, |column| column.len())
    }

    /// Names of the component types `entity` currently owns, in the order they
    /// were first attached.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not alive.
    pub fn component_names(&self, entity: Entity) -> Result<Vec<&'static str>, EcsError> {
        let record = self
            .entities
            .get(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?;
        Ok(record
            .types
            .iter()
            .map(|id| self.columns[id.index()].type_name())
            .collect())
    }

    /// Read-only self-description of every component on `entity`.
    ///
    /// The result is a JSON object keyed by component type name. Each value is
    /// the list of that type's instances, oldest first. When two distinct
    /// types share a name, the one added later is keyed `Name#<type id>`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not alive.
    pub fn inspect_entity(&self, entity: Entity) -> Result<serde_json::Value, EcsError> {
        let record = self
            .entities
            .get(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?;

        let mut map = serde_json::Map::new();
        for id in &record.types {
            let column = &self.columns[id.index()];
            let name = column.type_name();
            let key = if map.contains_key(name) {
                format!("{name}#{}", id.index())
            } else {
                name.to_string()
            };
            map.insert(key, serde_json::Value::Array(column.inspect(entity)));
        }
        Ok(serde_json::Value::Object(map))
    }
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentStore")
            .field("policy", &self.policy)
            .field("entities", &self.entities.len())
            .field("component_types", &self.registry.len())
            .finish()
    }
}
