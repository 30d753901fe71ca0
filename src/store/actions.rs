use crate::editable::EntityHandle;

/// Callbacks that propagate committed work to a backing store.
pub trait PersistenceActions<T> {
    fn on_edit(&mut self, entity: &EntityHandle<T>);
    fn on_add(&mut self, entity: &EntityHandle<T>);
    fn on_delete(&mut self, entity: &EntityHandle<T>);
}

type Callback<T> = Box<dyn FnMut(&EntityHandle<T>)>;

/// [`PersistenceActions`] assembled from closures. Missing callbacks are
/// no-ops.
pub struct ActionCallbacks<T> {
    edit: Option<Callback<T>>,
    add: Option<Callback<T>>,
    delete: Option<Callback<T>>,
}

impl<T> Default for ActionCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ActionCallbacks<T> {
    pub fn new() -> Self {
        Self {
            edit: None,
            add: None,
            delete: None,
        }
    }

    pub fn on_edit(mut self, callback: impl FnMut(&EntityHandle<T>) + 'static) -> Self {
        self.edit = Some(Box::new(callback));
        self
    }

    pub fn on_add(mut self, callback: impl FnMut(&EntityHandle<T>) + 'static) -> Self {
        self.add = Some(Box::new(callback));
        self
    }

    pub fn on_delete(mut self, callback: impl FnMut(&EntityHandle<T>) + 'static) -> Self {
        self.delete = Some(Box::new(callback));
        self
    }
}

impl<T> PersistenceActions<T> for ActionCallbacks<T> {
    fn on_edit(&mut self, entity: &EntityHandle<T>) {
        if let Some(callback) = self.edit.as_mut() {
            callback(entity);
        }
    }

    fn on_add(&mut self, entity: &EntityHandle<T>) {
        if let Some(callback) = self.add.as_mut() {
            callback(entity);
        }
    }

    fn on_delete(&mut self, entity: &EntityHandle<T>) {
        if let Some(callback) = self.delete.as_mut() {
            callback(entity);
        }
    }
}
