// ============================================================================
// Editable Entities and Sets
// ============================================================================
//
// Change tracking for plain entities:
// - EditableEntity: staged per-property edits plus new/deleted flags for one
//   original.
// - EditableSet: unit of work over many wrappers with staged inserts and
//   derived changed/deleted views.
//
// Everything here is single-threaded by construction (Rc/RefCell). Only the
// accessor registry in `meta` is shared across threads.
//
// ============================================================================

pub mod entity;
pub mod id;
pub mod notify;
pub mod set;
pub mod state;

pub use entity::{EditableEntity, EntityHandle};
pub use id::EditableId;
pub use notify::{ChangeEvent, ChangedProperty, Handler, Listeners, SetEvent, SubscriberId};
pub use set::{CommitOutcome, EditableSet};
pub use state::EditState;
