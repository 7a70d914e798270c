//! # neo_component
//!
//! The "E" and "C" in ECS: entity identity, component storage, and typed
//! queries.
//!
//! This crate provides:
//!
//! - [`Component`] trait: the contract all ECS data must satisfy.
//! - [`Entity`]: lightweight `u64` entity identifiers.
//! - [`ComponentStore`]: the single owner of every component instance.
//! - [`Column`]: dense per-type storage behind the store.
//! - [`Query`] / [`ComponentTuple`]: "every entity with A, B and C" lookups.

pub mod column;
pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod store;

pub use column::Column;
pub use component::{Component, ComponentPolicy, ComponentRegistry, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use error::EcsError;
pub use query::{ComponentTuple, Query, TupleKey};
pub use store::ComponentStore;
