//! Explicit observer lists for state-change broadcasts.

use std::fmt;

/// Handle returned by [`Observers::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A list of change callbacks.
///
/// New listeners are called immediately with the current value, so
/// consumers can render their initial state from the same callback.
///
/// ## Example
///
/// ```rust
/// use folio_ambience::Observers;
/// use std::{cell::RefCell, rc::Rc};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let mut observers = Observers::new();
/// let sink = Rc::clone(&seen);
/// let id = observers.subscribe(&1, move |v: &i32| sink.borrow_mut().push(*v));
/// observers.notify(&2);
/// observers.unsubscribe(id);
/// observers.notify(&3);
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub struct Observers<T> {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<dyn FnMut(&T)>)>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Register `callback`, invoking it once with `current` right away.
    pub fn subscribe<F>(&mut self, current: &T, mut callback: F) -> ListenerId
    where
        F: FnMut(&T) + 'static,
    {
        callback(current);
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Call every listener with `value`, in registration order.
    pub fn notify(&mut self, value: &T) {
        for (_, callback) in &mut self.listeners {
            callback(value);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
