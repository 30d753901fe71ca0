use super::PersistenceActions;
use crate::config::CommitMode;
use crate::core::Result;
use crate::editable::EditableSet;
use crate::meta::Entity;
use std::rc::Rc;
use tracing::info_span;

/// Counts of what one save routed to the persistence actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSet {
    pub deleted: usize,
    pub edited: usize,
    pub added: usize,
}

impl ChangeSet {
    pub fn total(&self) -> usize {
        self.deleted + self.edited + self.added
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl<T: Entity> EditableSet<T> {
    /// Commits the set and hands every affected original to `actions`.
    ///
    /// Deleted originals are routed first and their wrappers removed from the
    /// set. Committed inserts are tracked as ordinary originals afterwards,
    /// so the set keeps mirroring the store.
    ///
    /// With [`CommitMode::ValidateFirst`] every staged value is checked
    /// before any delete is routed, so a rejected value leaves both the set
    /// and the store untouched. With [`CommitMode::Sequential`] deletes are
    /// already routed when a later commit fails.
    pub fn save<A>(&mut self, actions: &mut A) -> Result<ChangeSet>
    where
        A: PersistenceActions<T>,
    {
        let span = info_span!("editable_set.save", set = %self.config().set_name);
        let _enter = span.enter();

        if self.config().commit_mode == CommitMode::ValidateFirst {
            self.validate_staged()?;
        }

        let deleted = self.remove_deleted();
        for original in &deleted {
            actions.on_delete(original);
        }

        let outcome = self.commit_grouped()?;
        for original in &outcome.changed {
            actions.on_edit(original);
        }
        for original in &outcome.inserted {
            actions.on_add(original);
            self.track_original(Rc::clone(original));
        }

        Ok(ChangeSet {
            deleted: deleted.len(),
            edited: outcome.changed.len(),
            added: outcome.inserted.len(),
        })
    }
}
