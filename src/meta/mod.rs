// ============================================================================
// Property Metadata
// ============================================================================
//
// Introspection surface for entity types and the per-type accessor cache.
// An entity describes its properties once through `Entity::properties`;
// the registry compiles that description into an `AccessorTable` and keeps
// it for the lifetime of the registry.
//
// ============================================================================

pub mod accessor;
pub mod descriptor;
pub mod registry;
pub mod table;

pub use accessor::{PropertyCheck, PropertyEntry, PropertyGetter, PropertySetter, PropertySpec};
pub use descriptor::PropertyDescriptor;
pub use registry::{AccessorRegistry, RegistryStats};
pub use table::AccessorTable;

/// A plain data type whose named properties can be tracked by an
/// [`EditableEntity`](crate::EditableEntity).
///
/// `Default` is required so that an [`EditableSet`](crate::EditableSet) can
/// stage brand-new instances. Implement it with `#[derive(Entity)]`.
pub trait Entity: Default + 'static {
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn properties() -> Vec<PropertySpec<Self>>;
}
