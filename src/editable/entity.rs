use super::notify::{SharedListeners, emit_shared};
use super::{ChangeEvent, ChangedProperty, EditState, EditableId, Listeners, SubscriberId};
use crate::config::EditConfig;
use crate::core::{EditError, Result, Value};
use crate::meta::{AccessorRegistry, AccessorTable, Entity, PropertyDescriptor};
use log::warn;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// Shared handle to an original entity.
///
/// The same handle is held by the source collection, the wrapper and
/// whatever the caller's store keeps, so committed values are visible to all
/// of them.
pub type EntityHandle<T> = Rc<RefCell<T>>;

/// Change-tracking wrapper around exactly one original entity.
///
/// Writes are staged in a pending map and only reach the original on
/// [`commit`](Self::commit). The pending map only ever holds values that
/// differ from what the original currently holds.
///
/// # Thread Safety
/// Not synchronized. The wrapper holds `Rc` handles and is `!Send`; all use
/// must happen on the thread that owns it.
pub struct EditableEntity<T: Entity> {
    id: EditableId,
    original: EntityHandle<T>,
    table: Arc<AccessorTable<T>>,
    pending: BTreeMap<usize, Value>,
    is_new: bool,
    is_deleted: bool,
    float_tolerance: f64,
    notify_all_on_commit: bool,
    listeners: Listeners<ChangeEvent>,
    relay: Option<SharedListeners<ChangeEvent>>,
}

impl<T: Entity> EditableEntity<T> {
    /// Wraps `original` using the shared accessor registry.
    pub fn new(original: T) -> Result<Self> {
        Self::from_handle(Rc::new(RefCell::new(original)))
    }

    /// Wraps a freshly constructed `T::default()`.
    pub fn new_default() -> Result<Self> {
        Self::new(T::default())
    }

    pub fn from_handle(original: EntityHandle<T>) -> Result<Self> {
        let table = AccessorRegistry::shared().table::<T>()?;
        Ok(Self::with_table(original, table, &EditConfig::default()))
    }

    pub fn with_table(
        original: EntityHandle<T>,
        table: Arc<AccessorTable<T>>,
        config: &EditConfig,
    ) -> Self {
        Self {
            id: EditableId::new(),
            original,
            table,
            pending: BTreeMap::new(),
            is_new: false,
            is_deleted: false,
            float_tolerance: config.float_tolerance,
            notify_all_on_commit: config.notify_all_on_commit,
            listeners: Listeners::new(),
            relay: None,
        }
    }

    pub fn id(&self) -> EditableId {
        self.id
    }

    pub fn original(&self) -> &EntityHandle<T> {
        &self.original
    }

    pub fn table(&self) -> &Arc<AccessorTable<T>> {
        &self.table
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.table.descriptors()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.table.find(name)
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Only the owning set marks wrappers as new.
    pub(crate) fn set_new(&mut self, is_new: bool) {
        self.is_new = is_new;
        self.notify(ChangedProperty::IsNew);
        self.notify(ChangedProperty::HasChanges);
    }

    /// Only the owning set flags deletes, so a staged insert is never
    /// flagged; see [`EditableSet::delete_item`](crate::EditableSet::delete_item).
    pub(crate) fn set_deleted(&mut self, is_deleted: bool) {
        self.is_deleted = is_deleted;
        self.notify(ChangedProperty::IsDeleted);
        self.notify(ChangedProperty::HasChanges);
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty() || self.is_deleted || self.is_new
    }

    pub fn state(&self) -> EditState {
        EditState {
            dirty: !self.pending.is_empty(),
            deleted: self.is_deleted,
            new: self.is_new,
        }
    }

    /// Current value of a property: the staged value if one exists, else the
    /// live value on the original. `None` for a descriptor this type does
    /// not know.
    pub fn read(&self, property: &PropertyDescriptor) -> Option<Value> {
        let entry = self.table.entry(property)?;
        if let Some(staged) = self.pending.get(&property.index()) {
            return Some(staged.clone());
        }
        Some(entry.get(&self.original.borrow()))
    }

    pub fn read_by_name(&self, name: &str) -> Option<Value> {
        let property = self.table.find(name)?;
        self.read(property)
    }

    /// Like [`read_by_name`](Self::read_by_name) but fails when the wrapped
    /// type has no property called `name`.
    pub fn read_uncommitted(&self, name: &str) -> Result<Value> {
        self.read_by_name(name)
            .ok_or_else(|| self.property_not_found(name))
    }

    /// Stages `value` for `property`.
    ///
    /// Writes to read-only or unknown properties are ignored. The value is
    /// compared with the live value on the original, not with an earlier
    /// staged value, so writing the original value back clears the entry.
    /// A null on one side never equals a non-null value on the other.
    ///
    /// Every attempt on a writable property notifies the property and
    /// `HasChanges`, including a rejected value: nothing is staged and the
    /// validation error is returned after observers ran.
    pub fn write(&mut self, property: &PropertyDescriptor, value: Value) -> Result<()> {
        let Some(entry) = self.table.entry(property) else {
            return Ok(());
        };
        if !entry.descriptor().is_writable() {
            return Ok(());
        }

        let index = property.index();
        let name = property.name();
        if let Err(err) = entry.validate(&value) {
            self.notify(ChangedProperty::Property(name));
            self.notify(ChangedProperty::HasChanges);
            return Err(err);
        }

        let live = entry.get(&self.original.borrow());
        if !live.equals_with_tolerance(&value, self.float_tolerance) {
            self.pending.insert(index, value);
        } else {
            self.pending.remove(&index);
        }

        self.notify(ChangedProperty::Property(name));
        self.notify(ChangedProperty::HasChanges);
        Ok(())
    }

    pub fn write_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let property = self
            .table
            .find(name)
            .cloned()
            .ok_or_else(|| self.property_not_found(name))?;
        self.write(&property, value.into())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_changes(&self) -> Vec<(&PropertyDescriptor, &Value)> {
        self.pending
            .iter()
            .filter_map(|(index, value)| {
                self.table
                    .entry_at(*index)
                    .map(|entry| (entry.descriptor(), value))
            })
            .collect()
    }

    pub fn is_property_changed(&self, name: &str) -> bool {
        self.table
            .find(name)
            .is_some_and(|property| self.pending.contains_key(&property.index()))
    }

    /// Re-validates every staged value and runs each setter against a
    /// scratch `T::default()`, leaving the original untouched.
    ///
    /// Setter refusals show up as [`EditError::CommitFailed`], the same error
    /// [`commit`](Self::commit) would report.
    pub fn validate_pending(&self) -> Result<()> {
        let mut scratch = T::default();
        for (index, value) in &self.pending {
            let Some(entry) = self.table.entry_at(*index) else {
                continue;
            };
            entry.validate(value)?;
            entry
                .set(&mut scratch, value.clone())
                .map_err(|err| EditError::CommitFailed {
                    property: entry.descriptor().name().to_string(),
                    reason: err.to_string(),
                })?;
        }
        Ok(())
    }

    /// Committed values of every property, ignoring staged ones.
    pub fn snapshot(&self) -> Vec<(&'static str, Value)> {
        let original = self.original.borrow();
        self.table
            .entries()
            .iter()
            .map(|entry| (entry.descriptor().name(), entry.get(&original)))
            .collect()
    }

    /// Applies every staged value to the original and clears the pending map.
    ///
    /// Entries for properties that lost their setter are dropped. A setter
    /// failure does not stop the remaining properties; the first failure is
    /// returned after the pending map has been cleared and observers have
    /// been notified.
    pub fn commit(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let touched = pending.keys().copied().collect::<Vec<_>>();
        let mut first_failure = None;

        {
            let mut original = self.original.borrow_mut();
            for (index, value) in pending {
                let Some(entry) = self.table.entry_at(index) else {
                    continue;
                };
                let name = entry.descriptor().name();
                match entry.set(&mut original, value) {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!("dropping staged value for read-only property '{}'", name);
                    }
                    Err(err) => {
                        warn!(
                            "failed to apply '{}' on '{}': {}",
                            name,
                            self.table.type_name(),
                            err
                        );
                        if first_failure.is_none() {
                            first_failure = Some(EditError::CommitFailed {
                                property: name.to_string(),
                                reason: err.to_string(),
                            });
                        }
                    }
                }
            }
        }

        self.notify_resync(&touched);

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Discards staged values and clears the deleted flag. `is_new` is kept.
    pub fn undo_changes(&mut self) {
        let touched = self.pending.keys().copied().collect::<Vec<_>>();
        self.pending.clear();
        self.notify_resync(&touched);
        self.set_deleted(false);
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&ChangeEvent) + 'static,
    {
        self.listeners.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub(crate) fn attach_relay(&mut self, relay: SharedListeners<ChangeEvent>) {
        self.relay = Some(relay);
    }

    fn notify_resync(&self, touched: &[usize]) {
        if self.notify_all_on_commit {
            for descriptor in self.table.descriptors() {
                self.notify(ChangedProperty::Property(descriptor.name()));
            }
        } else {
            for index in touched {
                if let Some(entry) = self.table.entry_at(*index) {
                    self.notify(ChangedProperty::Property(entry.descriptor().name()));
                }
            }
        }
        self.notify(ChangedProperty::HasChanges);
    }

    fn notify(&self, property: ChangedProperty) {
        let event = ChangeEvent {
            source: self.id,
            property,
        };
        self.listeners.emit(&event);
        if let Some(relay) = &self.relay {
            emit_shared(relay, &event);
        }
    }

    fn property_not_found(&self, name: &str) -> EditError {
        EditError::PropertyNotFound {
            type_name: self.table.type_name(),
            property: name.to_string(),
        }
    }
}

impl<T: Entity> std::fmt::Debug for EditableEntity<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditableEntity")
            .field("id", &self.id)
            .field("type", &self.table.type_name())
            .field("state", &self.state())
            .field("pending", &self.pending.len())
            .finish()
    }
}
