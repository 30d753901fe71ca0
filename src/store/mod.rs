//! Boundary between an [`EditableSet`](crate::EditableSet) and the store that
//! owns the real data.
//!
//! The core never persists anything itself. A save runs in three steps:
//! deleted originals go to `on_delete`, the set commits, then changed
//! originals go to `on_edit` and committed inserts go to `on_add`.

pub mod actions;
pub mod repository;
pub mod workflow;

pub use actions::{ActionCallbacks, PersistenceActions};
pub use repository::InMemoryRepository;
pub use workflow::ChangeSet;
