use super::notify::SharedListeners;
use super::{
    ChangeEvent, EditableEntity, EditableId, EntityHandle, Listeners, SetEvent, SubscriberId,
};
use crate::config::{CommitMode, EditConfig};
use crate::core::{EditError, Result};
use crate::meta::{AccessorRegistry, AccessorTable, Entity};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{Level, event, info_span, trace};

/// Originals touched by one commit, grouped by where they came from.
#[derive(Debug)]
pub struct CommitOutcome<T> {
    /// Originals of existing items that had staged edits
    pub changed: Vec<EntityHandle<T>>,
    /// Originals of staged inserts
    pub inserted: Vec<EntityHandle<T>>,
}

impl<T> CommitOutcome<T> {
    pub fn len(&self) -> usize {
        self.changed.len() + self.inserted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Changed originals first, then inserted ones.
    pub fn into_flat(self) -> Vec<EntityHandle<T>> {
        let mut all = self.changed;
        all.extend(self.inserted);
        all
    }
}

/// Unit of work over a collection of entities.
///
/// Wraps every source item in an [`EditableEntity`], keeps staged inserts
/// apart from the originals and derives the changed/deleted/editable views on
/// each access. An item lives either in the originals or in the staged
/// inserts, never in both, and only originals carry the deleted flag.
///
/// # Thread Safety
/// Not synchronized; the set is `!Send`. Callers that need to share it across
/// threads must own it behind their own synchronization.
pub struct EditableSet<T: Entity> {
    table: Arc<AccessorTable<T>>,
    config: EditConfig,
    originals: Vec<EditableEntity<T>>,
    inserted: Vec<EditableEntity<T>>,
    item_listeners: SharedListeners<ChangeEvent>,
    set_listeners: Listeners<SetEvent>,
}

impl<T: Entity> EditableSet<T> {
    /// Builds a set over `source` using the shared registry and default
    /// configuration.
    pub fn new<I>(source: I) -> Result<Self>
    where
        I: IntoIterator<Item = EntityHandle<T>>,
    {
        Self::with_registry(source, &AccessorRegistry::shared(), EditConfig::default())
    }

    pub fn with_registry<I>(source: I, registry: &AccessorRegistry, config: EditConfig) -> Result<Self>
    where
        I: IntoIterator<Item = EntityHandle<T>>,
    {
        config.validate()?;
        let table = registry.table::<T>()?;

        let mut set = Self {
            table,
            config,
            originals: Vec::new(),
            inserted: Vec::new(),
            item_listeners: Rc::new(RefCell::new(Listeners::new())),
            set_listeners: Listeners::new(),
        };
        for handle in source {
            let wrapper = set.wrap(handle);
            set.originals.push(wrapper);
        }
        Ok(set)
    }

    /// Builds a set over owned entities, moving each into a fresh handle.
    pub fn from_entities<I>(entities: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        Self::new(
            entities
                .into_iter()
                .map(|entity| Rc::new(RefCell::new(entity))),
        )
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    pub fn table(&self) -> &Arc<AccessorTable<T>> {
        &self.table
    }

    /// Number of wrappers, originals and staged inserts together.
    pub fn len(&self) -> usize {
        self.originals.len() + self.inserted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_changes(&self) -> bool {
        !self.inserted.is_empty() || self.originals.iter().any(EditableEntity::has_changes)
    }

    // ------------------------------------------------------------------
    // Derived views, recomputed on every call
    // ------------------------------------------------------------------

    pub fn all_items(&self) -> Vec<&EditableEntity<T>> {
        self.originals.iter().chain(self.inserted.iter()).collect()
    }

    pub fn editable_items(&self) -> Vec<&EditableEntity<T>> {
        self.originals
            .iter()
            .chain(self.inserted.iter())
            .filter(|item| !item.is_deleted())
            .collect()
    }

    pub fn changed_items(&self) -> Vec<&EditableEntity<T>> {
        self.originals
            .iter()
            .chain(self.inserted.iter())
            .filter(|item| !item.is_deleted() && item.has_changes())
            .collect()
    }

    pub fn deleted_items(&self) -> Vec<&EditableEntity<T>> {
        self.originals
            .iter()
            .filter(|item| item.is_deleted())
            .collect()
    }

    pub fn inserted(&self) -> Vec<&EditableEntity<T>> {
        self.inserted.iter().collect()
    }

    /// Handles of the source items, in source order.
    pub fn original_items(&self) -> Vec<EntityHandle<T>> {
        self.originals
            .iter()
            .map(|item| Rc::clone(item.original()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn get(&self, id: EditableId) -> Option<&EditableEntity<T>> {
        self.originals
            .iter()
            .chain(self.inserted.iter())
            .find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: EditableId) -> Option<&mut EditableEntity<T>> {
        self.originals
            .iter_mut()
            .chain(self.inserted.iter_mut())
            .find(|item| item.id() == id)
    }

    pub fn item_mut(&mut self, id: EditableId) -> Result<&mut EditableEntity<T>> {
        self.get_mut(id).ok_or(EditError::ItemNotFound(id))
    }

    /// Wrapper whose original is the same allocation as `handle`.
    pub fn find_by_original(&self, handle: &EntityHandle<T>) -> Option<&EditableEntity<T>> {
        self.originals
            .iter()
            .chain(self.inserted.iter())
            .find(|item| Rc::ptr_eq(item.original(), handle))
    }

    pub fn is_inserted(&self, id: EditableId) -> bool {
        self.inserted.iter().any(|item| item.id() == id)
    }

    // ------------------------------------------------------------------
    // Staging
    // ------------------------------------------------------------------

    /// Stages a new `T::default()` for insertion.
    pub fn add_new(&mut self) -> EditableId {
        self.add_new_item(T::default())
    }

    /// Stages a caller-built entity for insertion.
    pub fn add_new_item(&mut self, entity: T) -> EditableId {
        let mut wrapper = self.wrap(Rc::new(RefCell::new(entity)));
        wrapper.set_new(true);
        let id = wrapper.id();
        self.inserted.push(wrapper);

        trace!(%id, "staged insert");
        self.set_listeners.emit(&SetEvent::ItemInserted(id));
        id
    }

    /// Starts tracking an externally owned handle as an ordinary original.
    ///
    /// Used to absorb committed inserts back into the set once the backing
    /// store has accepted them.
    pub fn track_original(&mut self, handle: EntityHandle<T>) -> EditableId {
        if let Some(existing) = self.find_by_original(&handle) {
            return existing.id();
        }
        let wrapper = self.wrap(handle);
        let id = wrapper.id();
        self.originals.push(wrapper);
        id
    }

    /// Flags an original as deleted. A staged insert is dropped instead,
    /// since it never existed as an original.
    pub fn delete_item(&mut self, id: EditableId) -> Result<()> {
        if let Some(position) = self.inserted.iter().position(|item| item.id() == id) {
            self.inserted.remove(position);
            trace!(%id, "discarded staged insert on delete");
            self.set_listeners.emit(&SetEvent::ItemDiscarded(id));
            return Ok(());
        }

        let item = self
            .originals
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(EditError::ItemNotFound(id))?;
        item.set_deleted(true);

        trace!(%id, "flagged original as deleted");
        self.set_listeners.emit(&SetEvent::ItemDeleted(id));
        Ok(())
    }

    /// Removes wrappers flagged as deleted and returns their originals.
    ///
    /// Called once the backing store has hard-deleted them.
    pub fn remove_deleted(&mut self) -> Vec<EntityHandle<T>> {
        let (deleted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.originals)
            .into_iter()
            .partition(EditableEntity::is_deleted);
        self.originals = kept;

        if !deleted.is_empty() {
            self.set_listeners
                .emit(&SetEvent::ItemsRemoved(deleted.len()));
        }
        deleted
            .into_iter()
            .map(|item| Rc::clone(item.original()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Commit / undo
    // ------------------------------------------------------------------

    /// Applies all staged work and returns the touched originals, changed
    /// items first, then staged inserts.
    ///
    /// Deleted items are not applied here; route them from
    /// [`deleted_items`](Self::deleted_items) before committing.
    ///
    /// With [`CommitMode::Sequential`] the commit is not transactional across
    /// entities: when one entity fails, the entities before it stay
    /// committed and the staged inserts are kept.
    pub fn commit_changes(&mut self) -> Result<Vec<EntityHandle<T>>> {
        self.commit_grouped().map(CommitOutcome::into_flat)
    }

    /// Same as [`commit_changes`](Self::commit_changes) but keeps changed and
    /// inserted originals apart.
    pub fn commit_grouped(&mut self) -> Result<CommitOutcome<T>> {
        let span = info_span!("editable_set.commit", set = %self.config.set_name);
        let _enter = span.enter();

        if self.config.commit_mode == CommitMode::ValidateFirst {
            self.validate_staged()?;
        }

        let mut changed = Vec::new();
        for item in self.originals.iter_mut() {
            if item.is_deleted() || !item.has_changes() {
                continue;
            }
            item.commit()?;
            changed.push(Rc::clone(item.original()));
        }

        let mut inserted = Vec::with_capacity(self.inserted.len());
        for item in self.inserted.iter_mut() {
            item.commit()?;
            inserted.push(Rc::clone(item.original()));
        }
        self.inserted.clear();

        event!(
            Level::INFO,
            changed = changed.len(),
            inserted = inserted.len(),
            "committed editable set"
        );
        self.set_listeners.emit(&SetEvent::Committed {
            changed: changed.len(),
            inserted: inserted.len(),
        });

        Ok(CommitOutcome { changed, inserted })
    }

    /// Runs [`EditableEntity::validate_pending`] on every item a commit
    /// would apply. Nothing is modified.
    pub fn validate_staged(&self) -> Result<()> {
        for item in self.originals.iter().chain(self.inserted.iter()) {
            if !item.is_deleted() && item.has_changes() {
                item.validate_pending()?;
            }
        }
        Ok(())
    }

    /// Discards all staged work: edits, delete flags and staged inserts.
    pub fn undo_changes(&mut self) {
        let span = info_span!("editable_set.undo", set = %self.config.set_name);
        let _enter = span.enter();

        for item in self.originals.iter_mut() {
            if item.has_changes() {
                item.undo_changes();
            }
        }
        for item in self.inserted.iter_mut() {
            item.undo_changes();
        }
        let discarded = self.inserted.len();
        self.inserted.clear();

        event!(Level::INFO, discarded, "undid editable set");
        self.set_listeners.emit(&SetEvent::Undone);
    }

    /// Undoes one item. A staged insert is dropped entirely.
    pub fn undo_item_changes(&mut self, id: EditableId) -> Result<()> {
        if let Some(position) = self.inserted.iter().position(|item| item.id() == id) {
            let mut item = self.inserted.remove(position);
            item.undo_changes();
            self.set_listeners.emit(&SetEvent::ItemDiscarded(id));
            return Ok(());
        }

        self.item_mut(id)?.undo_changes();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------

    /// Subscribes to change events of every current and future wrapper.
    pub fn subscribe_items<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&ChangeEvent) + 'static,
    {
        self.item_listeners.borrow_mut().subscribe(handler)
    }

    pub fn unsubscribe_items(&mut self, id: SubscriberId) -> bool {
        self.item_listeners.borrow_mut().unsubscribe(id)
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&SetEvent) + 'static,
    {
        self.set_listeners.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.set_listeners.unsubscribe(id)
    }

    fn wrap(&self, handle: EntityHandle<T>) -> EditableEntity<T> {
        let mut wrapper = EditableEntity::with_table(handle, Arc::clone(&self.table), &self.config);
        wrapper.attach_relay(Rc::clone(&self.item_listeners));
        wrapper
    }
}

impl<T: Entity> std::fmt::Debug for EditableSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditableSet")
            .field("name", &self.config.set_name)
            .field("type", &self.table.type_name())
            .field("originals", &self.originals.len())
            .field("inserted", &self.inserted.len())
            .finish()
    }
}
