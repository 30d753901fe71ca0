// ============================================================================
// Editable Collections Library
// ============================================================================
//
// Change tracking and unit of work for editable collections of plain
// entities. Edits, inserts and deletes are staged against wrappers and only
// reach the originals on commit.
//
// ============================================================================

// Lets `#[derive(Entity)]` expand to `::editable_collections::...` paths
// inside this crate as well.
extern crate self as editable_collections;

pub mod config;
pub mod core;
pub mod editable;
pub mod meta;
pub mod store;

pub use config::{CommitMode, EditConfig};
pub use core::{DataType, EditError, PropertyValue, Result, Value};
pub use editable::{
    ChangeEvent, ChangedProperty, CommitOutcome, EditState, EditableEntity, EditableId,
    EditableSet, EntityHandle, SetEvent, SubscriberId,
};
pub use meta::{
    AccessorRegistry, AccessorTable, Entity, PropertyDescriptor, PropertySpec, RegistryStats,
};
pub use store::{ActionCallbacks, ChangeSet, InMemoryRepository, PersistenceActions};

/// Derives [`Entity`] for a struct with named fields.
///
/// Every field becomes a read/write property named after the field.
///
/// - `#[entity(readonly)]` exposes a field without a setter.
/// - `#[entity(skip)]` hides a field.
/// - `#[entity(rename = "...")]` changes the property name.
/// - `#[entity(name = "...")]` on the struct overrides the type name.
///
/// Field types must implement [`PropertyValue`].
pub use editable_collections_derive::Entity;
