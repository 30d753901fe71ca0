use super::PersistenceActions;
use crate::core::Result;
use crate::editable::{EditableSet, EntityHandle};
use crate::meta::Entity;
use std::cell::RefCell;
use std::rc::Rc;

/// Ordered in-memory store of entity handles.
///
/// Identity is by handle (`Rc::ptr_eq`), not by value, so two equal
/// entities are still two rows.
pub struct InMemoryRepository<T> {
    items: Vec<EntityHandle<T>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            items: entities
                .into_iter()
                .map(|entity| Rc::new(RefCell::new(entity)))
                .collect(),
        }
    }

    pub fn items(&self) -> &[EntityHandle<T>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, entity: &EntityHandle<T>) -> bool {
        self.items.iter().any(|item| Rc::ptr_eq(item, entity))
    }

    /// Appends the handle unless it is already stored.
    pub fn save(&mut self, entity: &EntityHandle<T>) -> bool {
        if self.contains(entity) {
            return false;
        }
        self.items.push(Rc::clone(entity));
        true
    }

    pub fn delete(&mut self, entity: &EntityHandle<T>) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !Rc::ptr_eq(item, entity));
        self.items.len() != before
    }
}

impl<T: Entity> InMemoryRepository<T> {
    /// Editable view over the current contents.
    pub fn editable_set(&self) -> Result<EditableSet<T>> {
        EditableSet::new(self.items.iter().cloned())
    }
}

impl<T> PersistenceActions<T> for InMemoryRepository<T> {
    fn on_edit(&mut self, entity: &EntityHandle<T>) {
        self.save(entity);
    }

    fn on_add(&mut self, entity: &EntityHandle<T>) {
        self.save(entity);
    }

    fn on_delete(&mut self, entity: &EntityHandle<T>) {
        self.delete(entity);
    }
}
