//! Store and query error types.

use crate::entity::Entity;

/// Errors raised by the component store and its queries.
///
/// Apart from [`EcsError::MissingSingleton`], every variant signals a
/// programming error in the caller. They are returned rather than panicking
/// so a single misbehaving system can't take the frame loop down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity is null, was never allocated, or has been removed.
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    /// A second instance was added under the single-instance policy.
    #[error("{entity} already has a {component} component")]
    DuplicateComponent {
        /// The entity that already holds the component.
        entity: Entity,
        /// The component type name.
        component: &'static str,
    },

    /// A required component is absent from a live entity.
    #[error("{entity} has no {component} component")]
    ComponentNotFound {
        /// The entity that was probed.
        entity: Entity,
        /// The component type name.
        component: &'static str,
    },

    /// A singleton query matched no entity.
    #[error("no entity matches singleton query ({0})")]
    MissingSingleton(String),

    /// A component type was requested from a tuple that was not built with it.
    #[error("{0} is not part of this component tuple")]
    NotInTuple(&'static str),

    /// A tuple key was resolved after one of its component types saw a removal.
    #[error("component tuple for {0} is stale")]
    StaleTuple(Entity),
}
