//! Typed queries and component tuples.
//!
//! A [`Query`] names a set of component types, written as a Rust tuple such as
//! `(Camera, Spatial)`. The store answers it with one [`ComponentTuple`] per
//! entity that owns at least one instance of every type.
//!
//! ## Matching
//!
//! The smallest column among the requested types drives the scan. Every
//! distinct owner in that column is probed against the remaining types, and
//! rejected on the first miss. Probe order only affects cost: the matched set
//! is the same whichever column drives.

use std::any::Any;
use std::collections::HashSet;

use crate::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::store::ComponentStore;

/// A set of component types that a query requires.
///
/// Implemented for tuples of one to six [`Component`] types.
pub trait Query {
    /// Resolve the type ids, or `None` if any type was never registered (in
    /// which case nothing can match).
    fn type_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>>;

    /// Component type names, for diagnostics.
    fn type_names() -> Vec<&'static str>;
}

macro_rules! impl_query {
    ($($name:ident),+) => {
        impl<$($name: Component),+> Query for ($($name,)+) {
            fn type_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>> {
                Some(vec![$(registry.id_of::<$name>()?),+])
            }

            fn type_names() -> Vec<&'static str> {
                vec![$($name::type_name()),+]
            }
        }
    };
}

impl_query!(A);
impl_query!(A, B);
impl_query!(A, B, C);
impl_query!(A, B, C, D);
impl_query!(A, B, C, D, E);
impl_query!(A, B, C, D, E, F);

/// One component reference held by a tuple.
#[derive(Clone, Copy)]
struct TuplePart<'a> {
    type_id: ComponentTypeId,
    name: &'static str,
    value: &'a dyn Any,
    removal_generation: u64,
}

/// A read-only view of several components owned by one entity.
///
/// Holds the oldest instance of each requested type. The tuple borrows the
/// store, so no structural change can happen while it is alive. To remember a
/// match across changes, keep its [`TupleKey`] and
/// [`resolve`](ComponentStore::resolve) it later.
#[derive(Clone)]
pub struct ComponentTuple<'a> {
    entity: Entity,
    parts: Vec<TuplePart<'a>>,
}

impl<'a> ComponentTuple<'a> {
    /// The entity this tuple describes.
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The component of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was not one of the queried types. That is a bug in the
    /// calling code, not a runtime condition; use [`try_get`](Self::try_get)
    /// where the type set is not known statically.
    #[must_use]
    pub fn get<T: Component>(&self) -> &'a T {
        match self.try_get::<T>() {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }

    /// The component of type `T`, or [`EcsError::NotInTuple`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::NotInTuple`] if `T` was not one of the queried types.
    pub fn try_get<T: Component>(&self) -> Result<&'a T, EcsError> {
        self.parts
            .iter()
            .find_map(|part| part.value.downcast_ref::<T>())
            .ok_or(EcsError::NotInTuple(T::type_name()))
    }

    /// Names of the component types in this tuple, in query order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        self.parts.iter().map(|part| part.name).collect()
    }

    /// A detached key that can re-open this tuple later.
    #[must_use]
    pub fn key(&self) -> TupleKey {
        TupleKey {
            entity: self.entity,
            parts: self
                .parts
                .iter()
                .map(|part| (part.type_id, part.removal_generation))
                .collect(),
        }
    }
}

impl std::fmt::Debug for ComponentTuple<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentTuple")
            .field("entity", &self.entity)
            .field("types", &self.type_names())
            .finish()
    }
}

/// A detached reference to a [`ComponentTuple`].
///
/// Records the removal generation of every column involved. Resolving the key
/// after any of those columns saw a removal fails with
/// [`EcsError::StaleTuple`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleKey {
    entity: Entity,
    parts: Vec<(ComponentTypeId, u64)>,
}

impl TupleKey {
    /// The entity this key refers to.
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }
}

impl ComponentStore {
    /// One tuple per entity that owns every type in `Q`.
    ///
    /// Tuples come back in the driver column's order.
    #[must_use]
    pub fn get_component_tuples<Q: Query>(&self) -> Vec<ComponentTuple<'_>> {
        let Some(ids) = Q::type_ids(self.registry()) else {
            return Vec::new();
        };
        let driver = self.smallest_column(&ids);
        self.collect_tuples(&ids, driver)
    }

    /// The first-created entity matching `Q`, for singleton-like components.
    #[must_use]
    pub fn get_component_tuple<Q: Query>(&self) -> Option<ComponentTuple<'_>> {
        self.get_component_tuples::<Q>()
            .into_iter()
            .min_by_key(ComponentTuple::entity)
    }

    /// Like [`get_component_tuple`](Self::get_component_tuple), but a miss is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingSingleton`] when nothing matches.
    pub fn require_component_tuple<Q: Query>(&self) -> Result<ComponentTuple<'_>, EcsError> {
        self.get_component_tuple::<Q>()
            .ok_or_else(|| EcsError::MissingSingleton(Q::type_names().join(", ")))
    }

    /// The tuple for one specific entity, if it matches `Q`.
    #[must_use]
    pub fn component_tuple_of<Q: Query>(&self, entity: Entity) -> Option<ComponentTuple<'_>> {
        if !self.is_alive(entity) {
            return None;
        }
        let ids = Q::type_ids(self.registry())?;
        self.build_tuple(entity, &ids)
    }

    /// Entities matching `Q`, sorted by id.
    ///
    /// The list owns no borrow of the store, so callers can mutate components
    /// while walking it.
    #[must_use]
    pub fn query_entities<Q: Query>(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self
            .get_component_tuples::<Q>()
            .iter()
            .map(ComponentTuple::entity)
            .collect();
        entities.sort();
        entities
    }

    /// Re-open a tuple from its key.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityNotFound`] if the entity has been removed.
    /// - [`EcsError::StaleTuple`] if any involved column saw a removal since
    ///   the key was taken.
    pub fn resolve(&self, key: &TupleKey) -> Result<ComponentTuple<'_>, EcsError> {
        if !self.is_alive(key.entity) {
            return Err(EcsError::EntityNotFound(key.entity));
        }
        let stale = key.parts.iter().any(|&(id, generation)| {
            self.columns
                .get(id.index())
                .is_none_or(|column| column.removal_generation() != generation)
        });
        if stale {
            return Err(EcsError::StaleTuple(key.entity));
        }

        let ids: Vec<ComponentTypeId> = key.parts.iter().map(|&(id, _)| id).collect();
        self.build_tuple(key.entity, &ids)
            .ok_or(EcsError::StaleTuple(key.entity))
    }

    /// Index into `ids` of the type with the fewest instances.
    fn smallest_column(&self, ids: &[ComponentTypeId]) -> usize {
        ids.iter()
            .enumerate()
            .min_by_key(|(_, id)| self.columns[id.index()].len())
            .map_or(0, |(index, _)| index)
    }

    /// Scan the column `ids[driver]` and probe the others for each owner.
    pub(crate) fn collect_tuples(
        &self,
        ids: &[ComponentTypeId],
        driver: usize,
    ) -> Vec<ComponentTuple<'_>> {
        let Some(driver_id) = ids.get(driver) else {
            return Vec::new();
        };
        let column = &self.columns[driver_id.index()];

        let mut seen = HashSet::new();
        let mut tuples = Vec::new();
        for row in 0..column.len() {
            let entity = column.entity_at(row);
            if !seen.insert(entity) {
                continue;
            }
            if let Some(tuple) = self.build_tuple(entity, ids) {
                tuples.push(tuple);
            }
        }
        tuples
    }

    fn build_tuple(&self, entity: Entity, ids: &[ComponentTypeId]) -> Option<ComponentTuple<'_>> {
        let mut parts = Vec::with_capacity(ids.len());
        for &id in ids {
            let column = &self.columns[id.index()];
            let value = column.first_any(entity)?;
            parts.push(TuplePart {
                type_id: id,
                name: column.type_name(),
                value,
                removal_generation: column.removal_generation(),
            });
        }
        Some(ComponentTuple { entity, parts })
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Spatial {
        pos: (f32, f32, f32),
    }

    impl Component for Spatial {
        fn type_name() -> &'static str {
            "Spatial"
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Camera {
        fov: f32,
    }

    impl Component for Camera {
        fn type_name() -> &'static str {
            "Camera"
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Mesh(u32);

    impl Component for Mesh {
        fn type_name() -> &'static str {
            "Mesh"
        }
    }

    fn sorted(tuples: &[ComponentTuple<'_>]) -> Vec<Entity> {
        let mut entities: Vec<Entity> = tuples.iter().map(ComponentTuple::entity).collect();
        entities.sort();
        entities
    }

    #[test]
    fn test_camera_spatial_scenario() {
        let mut store = ComponentStore::new();
        let e1 = store.create_entity();
        store.add_component(e1, Spatial { pos: (0.0, 0.0, 0.0) }).unwrap();
        store.add_component(e1, Camera { fov: 45.0 }).unwrap();
        let e2 = store.create_entity();
        store.add_component(e2, Spatial { pos: (0.0, 0.0, 0.0) }).unwrap();

        let tuples = store.get_component_tuples::<(Camera, Spatial)>();
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].entity(), e1);
        assert_eq!(tuples[0].get::<Camera>().fov, 45.0);
        assert_eq!(tuples[0].get::<Spatial>().pos, (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_match_set_independent_of_driver() {
        let mut store = ComponentStore::new();
        let mut expected = Vec::new();
        for i in 0..12u32 {
            let e = store.create_entity();
            if i % 2 == 0 {
                store.add_component(e, Spatial { pos: (i as f32, 0.0, 0.0) }).unwrap();
            }
            if i % 3 == 0 {
                store.add_component(e, Mesh(i)).unwrap();
                store.add_component(e, Mesh(i + 100)).unwrap();
            }
            if i % 2 == 0 && i % 3 == 0 {
                expected.push(e);
            }
        }
        // Removals shuffle column order without changing membership.
        let victim = store.entities()[0];
        store.remove_entity(victim).unwrap();
        expected.retain(|&e| e != victim);

        let ids = <(Spatial, Mesh)>::type_ids(store.registry()).unwrap();
        let driven_by_spatial = store.collect_tuples(&ids, 0);
        let driven_by_mesh = store.collect_tuples(&ids, 1);

        assert_eq!(sorted(&driven_by_spatial), expected);
        assert_eq!(sorted(&driven_by_mesh), expected);
        assert_eq!(store.query_entities::<(Mesh, Spatial)>(), expected);
    }

    #[test]
    fn test_multi_instance_owner_yields_one_tuple() {
        let mut store = ComponentStore::new();
        let e = store.create_entity();
        store.add_component(e, Mesh(1)).unwrap();
        store.add_component(e, Mesh(2)).unwrap();
        store.add_component(e, Camera { fov: 60.0 }).unwrap();

        let tuples = store.get_component_tuples::<(Mesh, Camera)>();
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].get::<Mesh>(), &Mesh(1));
    }

    #[test]
    fn test_unregistered_type_matches_nothing() {
        let mut store = ComponentStore::new();
        let e = store.create_entity();
        store.add_component(e, Spatial { pos: (1.0, 1.0, 1.0) }).unwrap();
        assert!(store.get_component_tuples::<(Spatial, Camera)>().is_empty());
        assert!(store.get_component_tuple::<(Camera,)>().is_none());
    }

    #[test]
    fn test_singleton_picks_first_created() {
        let mut store = ComponentStore::new();
        let first = store.create_entity();
        let second = store.create_entity();
        // Insert the later entity's camera first so column order disagrees
        // with creation order.
        store.add_component(second, Camera { fov: 90.0 }).unwrap();
        store.add_component(first, Camera { fov: 45.0 }).unwrap();

        let tuple = store.get_component_tuple::<(Camera,)>().unwrap();
        assert_eq!(tuple.entity(), first);
        assert_eq!(tuple.get::<Camera>().fov, 45.0);
    }

    #[test]
    fn test_require_singleton_reports_query() {
        let store = ComponentStore::new();
        let err = store.require_component_tuple::<(Camera, Spatial)>().unwrap_err();
        assert_eq!(err, EcsError::MissingSingleton("Camera, Spatial".to_string()));
        assert_eq!(
            err.to_string(),
            "no entity matches singleton query (Camera, Spatial)"
        );

        // A one-element query names just that type.
        let err = store.require_component_tuple::<(Mesh,)>().unwrap_err();
        assert_eq!(err, EcsError::MissingSingleton("Mesh".to_string()));
    }

    #[test]
    fn test_try_get_outside_query() {
        let mut store = ComponentStore::new();
        let e = store.create_entity();
        store.add_component(e, Camera { fov: 45.0 }).unwrap();
        store.add_component(e, Mesh(3)).unwrap();

        let tuple = store.component_tuple_of::<(Camera,)>(e).unwrap();
        assert_eq!(tuple.try_get::<Mesh>().unwrap_err(), EcsError::NotInTuple("Mesh"));
    }

    #[test]
    #[should_panic(expected = "Mesh is not part of this component tuple")]
    fn test_get_outside_query_panics() {
        let mut store = ComponentStore::new();
        let e = store.create_entity();
        store.add_component(e, Camera { fov: 45.0 }).unwrap();
        let tuple = store.component_tuple_of::<(Camera,)>(e).unwrap();
        let _ = tuple.get::<Mesh>();
    }

    #[test]
    fn test_key_goes_stale_after_removal() {
        let mut store = ComponentStore::new();
        let e1 = store.create_entity();
        let e2 = store.create_entity();
        for e in [e1, e2] {
            store.add_component(e, Camera { fov: 45.0 }).unwrap();
            store.add_component(e, Spatial { pos: (0.0, 0.0, 0.0) }).unwrap();
        }

        let key = store.component_tuple_of::<(Camera, Spatial)>(e1).unwrap().key();
        assert_eq!(store.resolve(&key).unwrap().entity(), e1);

        // Adding elsewhere leaves the key valid.
        let e3 = store.create_entity();
        store.add_component(e3, Camera { fov: 30.0 }).unwrap();
        assert!(store.resolve(&key).is_ok());

        // Any removal on an involved type invalidates it.
        store.remove_component::<Camera>(e2).unwrap();
        assert_eq!(store.resolve(&key).unwrap_err(), EcsError::StaleTuple(e1));
    }

    #[test]
    fn test_key_for_removed_entity() {
        let mut store = ComponentStore::new();
        let e = store.create_entity();
        store.add_component(e, Camera { fov: 45.0 }).unwrap();
        let key = store.component_tuple_of::<(Camera,)>(e).unwrap().key();
        store.remove_entity(e).unwrap();
        assert_eq!(store.resolve(&key).unwrap_err(), EcsError::EntityNotFound(e));
    }

    #[test]
    fn test_tuples_for_removed_entity_are_gone() {
        let mut store = ComponentStore::new();
        let e1 = store.create_entity();
        let e2 = store.create_entity();
        for e in [e1, e2] {
            store.add_component(e, Camera { fov: 45.0 }).unwrap();
            store.add_component(e, Mesh(0)).unwrap();
        }
        store.remove_entity(e1).unwrap();
        assert_eq!(store.query_entities::<(Camera, Mesh)>(), vec![e2]);
        assert!(store.component_tuple_of::<(Camera, Mesh)>(e1).is_none());
    }
}
