//! Synchronous listener lists
//!
//! An [`Event`] holds callbacks that run to completion, in registration
//! order, every time the event is invoked. There is no queueing: a
//! notification is fully delivered before `invoke` returns.

use std::fmt;

/// Handle returned by [`Event::add`], used to remove the listener later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Box<dyn FnMut(&T)>;

/// Ordered list of listeners for notifications carrying a `T`.
pub struct Event<T> {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<T>)>,
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn add(&mut self, listener: impl FnMut(&T) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the listener was already removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn invoke(&mut self, value: &T) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut event = Event::<u32>::new();

        let first = Rc::clone(&log);
        event.add(move |v| first.borrow_mut().push(("first", *v)));
        let second = Rc::clone(&log);
        event.add(move |v| second.borrow_mut().push(("second", *v)));

        event.invoke(&7);
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let hits = Rc::new(RefCell::new(0));
        let mut event = Event::<()>::new();
        let counter = Rc::clone(&hits);
        let id = event.add(move |_| *counter.borrow_mut() += 1);

        assert!(event.remove(id));
        assert!(!event.remove(id));
        event.invoke(&());
        assert_eq!(*hits.borrow(), 0);
        assert!(event.is_empty());
    }
}
