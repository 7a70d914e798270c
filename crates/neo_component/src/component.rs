//! Core [`Component`] trait and the dense type-tag registry.
//!
//! Every piece of data stored in the ECS must implement [`Component`]. Each
//! component type is assigned a small [`ComponentTypeId`] the first time a
//! store sees it; the id indexes straight into the store's column vector.

use std::any::TypeId;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A dense identifier for a component type within one store.
///
/// Ids are assigned in registration order starting at zero. They are only
/// meaningful for the [`ComponentRegistry`] that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentTypeId(pub u32);

impl ComponentTypeId {
    /// Returns the id as a column index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The core component trait.
///
/// Components are plain data. `Serialize` doubles as the read-only
/// inspection hook used by the editor pass.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use neo_component::Component;
///
/// #[derive(Debug, Clone, Serialize)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Serialize + 'static {
    /// A human-readable name for this component type.
    fn type_name() -> &'static str;
}

/// How many instances of one component type an entity may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentPolicy {
    /// 0..N instances per type per entity. Lookups return lists.
    #[default]
    Multiple,
    /// At most one instance per type per entity. A second add is rejected.
    Single,
}

/// Maps Rust types to dense [`ComponentTypeId`]s.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentTypeId>,
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `T`, assigning the next free one if `T` is new.
    ///
    /// The second element is `true` when the id was freshly assigned.
    pub fn register<T: Component>(&mut self) -> (ComponentTypeId, bool) {
        if let Some(&id) = self.ids.get(&TypeId::of::<T>()) {
            return (id, false);
        }
        let id = ComponentTypeId(self.names.len() as u32);
        self.ids.insert(TypeId::of::<T>(), id);
        self.names.push(T::type_name());
        (id, true)
    }

    /// Returns the id for `T` if it has been registered.
    #[must_use]
    pub fn id_of<T: Component>(&self) -> Option<ComponentTypeId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the id for a raw [`TypeId`] if it has been registered.
    #[must_use]
    pub fn id_of_type(&self, type_id: TypeId) -> Option<ComponentTypeId> {
        self.ids.get(&type_id).copied()
    }

    /// Returns the registered name of a component type.
    #[must_use]
    pub fn name(&self, id: ComponentTypeId) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    /// Number of registered component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no component type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
