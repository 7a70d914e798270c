//! Dense per-type component storage.
//!
//! A [`Column`] stores every instance of one component type in a contiguous
//! vector, with the owning entities in a parallel vector. `entities[i]` owns
//! `values[i]`. Removal swap-removes, so iteration order is insertion order
//! until the first removal and unspecified for the moved slot afterwards.

use std::any::Any;
use std::collections::HashMap;

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;

/// Storage for all instances of a single component type.
#[derive(Debug)]
pub struct Column<T> {
    type_id: ComponentTypeId,
    entities: Vec<Entity>,
    values: Vec<T>,
    /// Rows owned by each entity, oldest instance first.
    rows: HashMap<Entity, Vec<usize>>,
    /// Bumped on every removal; tuple keys compare against it.
    removals: u64,
}

impl<T: Component> Column<T> {
    /// Create an empty column for the given component type.
    #[must_use]
    pub fn new(type_id: ComponentTypeId) -> Self {
        Self {
            type_id,
            entities: Vec::new(),
            values: Vec::new(),
            rows: HashMap::new(),
            removals: 0,
        }
    }

    /// The component type stored in this column.
    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    /// Number of instances stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if this column holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of removals this column has seen.
    #[must_use]
    pub fn removal_generation(&self) -> u64 {
        self.removals
    }

    /// Append an instance owned by `entity` and return it.
    pub fn push(&mut self, entity: Entity, value: T) -> &mut T {
        let row = self.values.len();
        self.entities.push(entity);
        self.values.push(value);
        self.rows.entry(entity).or_default().push(row);
        &mut self.values[row]
    }

    /// Returns `true` if `entity` owns at least one instance.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.contains_key(&entity)
    }

    /// Number of instances owned by `entity`.
    #[must_use]
    pub fn count_of(&self, entity: Entity) -> usize {
        self.rows.get(&entity).map_or(0, Vec::len)
    }

    /// The oldest live instance owned by `entity`.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let row = *self.rows.get(&entity)?.first()?;
        self.values.get(row)
    }

    /// Mutable access to the oldest live instance owned by `entity`.
    #[must_use]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let row = *self.rows.get(&entity)?.first()?;
        self.values.get_mut(row)
    }

    /// Every instance owned by `entity`, oldest first.
    #[must_use]
    pub fn get_all(&self, entity: Entity) -> Vec<&T> {
        self.rows
            .get(&entity)
            .map(|rows| rows.iter().map(|&row| &self.values[row]).collect())
            .unwrap_or_default()
    }

    /// All instances in column order.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable access to all instances in column order.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Iterate `(owner, instance)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Iterate `(owner, instance)` pairs mutably in column order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Remove and return every instance owned by `entity`.
    ///
    /// The returned values are oldest first.
    pub fn take(&mut self, entity: Entity) -> Vec<T> {
        let Some(rows) = self.rows.remove(&entity) else {
            return Vec::new();
        };

        // Highest row first: every row above the current one that belonged to
        // `entity` is already gone, so the swapped-in tail never belongs to it.
        let mut ordered: Vec<(usize, usize)> = rows.iter().copied().enumerate().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        let mut taken: Vec<(usize, T)> = Vec::with_capacity(ordered.len());
        for (age, row) in ordered {
            taken.push((age, self.swap_remove_row(row)));
        }
        self.removals += 1;

        taken.sort_by_key(|(age, _)| *age);
        taken.into_iter().map(|(_, value)| value).collect()
    }

    fn swap_remove_row(&mut self, row: usize) -> T {
        let last = self.values.len() - 1;
        let value = self.values.swap_remove(row);
        self.entities.swap_remove(row);

        if row != last {
            let moved = self.entities[row];
            if let Some(slot) = self
                .rows
                .get_mut(&moved)
                .and_then(|rows| rows.iter_mut().find(|r| **r == last))
            {
                *slot = row;
            }
        }
        value
    }
}

/// Type-erased view of a [`Column`], used where the store handles every
/// component type uniformly (entity cascade, inspection, tuple probing).
pub(crate) trait ErasedColumn: Any {
    fn component_id(&self) -> ComponentTypeId;
    fn type_name(&self) -> &'static str;
    fn len(&self) -> usize;
    fn entity_at(&self, row: usize) -> Entity;
    fn contains(&self, entity: Entity) -> bool;
    fn first_any(&self, entity: Entity) -> Option<&dyn Any>;
    fn removal_generation(&self) -> u64;
    fn remove_entity(&mut self, entity: Entity) -> usize;
    fn inspect(&self, entity: Entity) -> Vec<serde_json::Value>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedColumn for Column<T> {
    fn component_id(&self) -> ComponentTypeId {
        self.type_id
    }

    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn entity_at(&self, row: usize) -> Entity {
        self.entities[row]
    }

    fn contains(&self, entity: Entity) -> bool {
        Column::contains(self, entity)
    }

    fn first_any(&self, entity: Entity) -> Option<&dyn Any> {
        self.get(entity).map(|value| value as &dyn Any)
    }

    fn removal_generation(&self) -> u64 {
        self.removals
    }

    fn remove_entity(&mut self, entity: Entity) -> usize {
        self.take(entity).len()
    }

    fn inspect(&self, entity: Entity) -> Vec<serde_json::Value> {
        self.get_all(entity)
            .into_iter()
            .map(|value| {
                serde_json::to_value(value)
                    .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
