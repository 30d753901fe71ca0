// ============================================================================
// Change Notification
// ============================================================================
//
// Synchronous observer registry. Handlers run before the call that triggered
// the event returns, in subscription order. Handlers are reference counted
// (`Rc`) because wrappers and sets are single-threaded by construction.
//
// ============================================================================

use super::EditableId;
use std::cell::RefCell;
use std::rc::Rc;

/// What changed on a wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangedProperty {
    /// A named entity property
    Property(&'static str),
    /// The derived `has_changes` state
    HasChanges,
    IsNew,
    IsDeleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub source: EditableId,
    pub property: ChangedProperty,
}

/// Set-level lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetEvent {
    /// A new wrapper was staged for insertion
    ItemInserted(EditableId),
    /// A staged insert was dropped without being committed
    ItemDiscarded(EditableId),
    /// An original was flagged as deleted
    ItemDeleted(EditableId),
    /// Wrappers flagged as deleted were removed from the set
    ItemsRemoved(usize),
    Committed { changed: usize, inserted: usize },
    Undone,
}

/// Subscriber ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

pub type Handler<E> = Rc<dyn Fn(&E)>;

pub(crate) type SharedListeners<E> = Rc<RefCell<Listeners<E>>>;

pub struct Listeners<E> {
    next_id: u64,
    handlers: Vec<(SubscriberId, Handler<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            handlers: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + 'static,
    {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Rc::new(handler)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub_id, _)| *sub_id != id);
        self.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn emit(&self, event: &E) {
        for (_, handler) in &self.handlers {
            handler(event);
        }
    }

    fn handlers(&self) -> Vec<Handler<E>> {
        self.handlers
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect()
    }
}

/// Emits through a shared registry without holding its borrow, so handlers
/// may subscribe or unsubscribe while being notified.
pub(crate) fn emit_shared<E>(shared: &SharedListeners<E>, event: &E) {
    let handlers = shared.borrow().handlers();
    for handler in handlers {
        handler(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let count = Rc::new(Cell::new(0));
        let mut listeners = Listeners::<u32>::new();

        let seen = Rc::clone(&count);
        let id = listeners.subscribe(move |value| seen.set(seen.get() + *value));

        listeners.emit(&2);
        assert_eq!(count.get(), 2);

        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(&5);
        assert_eq!(count.get(), 2);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_shared_emit_allows_reentrant_subscription() {
        let shared: SharedListeners<u32> = Rc::new(RefCell::new(Listeners::new()));
        let inner = Rc::clone(&shared);
        shared.borrow_mut().subscribe(move |_| {
            inner.borrow_mut().subscribe(|_| {});
        });

        emit_shared(&shared, &1);
        assert_eq!(shared.borrow().len(), 2);
    }
}
