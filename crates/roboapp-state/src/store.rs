//! [`Store`] – a reactive holder of a single current value.
//!
//! A store keeps one value and an ordered list of subscriber callbacks.
//! [`Store::set`] replaces the value and calls every active subscriber with
//! the new value, in subscription order, before returning.
//! [`Store::subscribe`] calls the new subscriber once with the current value
//! before returning.
//!
//! # Re-entrancy
//!
//! A `set` issued while the store is already notifying (for example from
//! inside a subscriber) is queued.  The outermost `set` drains the queue in
//! FIFO order before it returns, so every subscriber observes every value in
//! the order the `set` calls were made.
//!
//! Stores are single-threaded (`!Send`).  Producers on other threads must
//! hand their values over to the owning thread first.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

type Callback<T> = RefCell<Box<dyn FnMut(&T)>>;

struct Subscriber<T> {
    id: u64,
    active: Cell<bool>,
    callback: Callback<T>,
}

struct Inner<T> {
    label: &'static str,
    value: RefCell<T>,
    subscribers: RefCell<Vec<Rc<Subscriber<T>>>>,
    next_id: Cell<u64>,
    pending: RefCell<VecDeque<T>>,
    dispatching: Cell<bool>,
}

/// Shared reactive value cell.
///
/// Cloning a `Store` is cheap; all clones refer to the same value and the
/// same subscriber list.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use roboapp_state::Store;
///
/// let store = Store::new(0.0_f64);
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = Rc::clone(&seen);
/// let sub = store.subscribe(move |v| sink.borrow_mut().push(*v));
/// store.set(42.0);
/// sub.unsubscribe();
/// store.set(7.0);
///
/// assert_eq!(*seen.borrow(), vec![0.0, 42.0]);
/// assert_eq!(store.get(), 7.0);
/// ```
pub struct Store<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Store<T> {
    /// Create a store holding `initial`.
    pub fn new(initial: T) -> Self {
        Self::with_label("store", initial)
    }

    /// Create a store whose log lines carry `label`.
    pub fn with_label(label: &'static str, initial: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                label,
                value: RefCell::new(initial),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    /// The label given at construction.
    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    /// Replace the current value and notify every active subscriber.
    ///
    /// Called from inside a notification, the value is queued and delivered
    /// once the fan-out in progress has finished.
    pub fn set(&self, value: T) {
        self.inner.pending.borrow_mut().push_back(value);
        if let Some(_guard) = DispatchGuard::enter(&self.inner) {
            self.drain();
        }
    }

    /// Register `callback`, call it once with the current value, and return
    /// the handle that removes it again.
    ///
    /// A subscriber added during a notification receives the current value
    /// immediately and every value set afterwards, but not the rest of the
    /// fan-out already in progress.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let subscriber = Rc::new(Subscriber {
            id,
            active: Cell::new(true),
            callback: RefCell::new(Box::new(callback)),
        });
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::clone(&subscriber));

        let guard = DispatchGuard::enter(&self.inner);
        {
            let value = self.inner.value.borrow();
            (subscriber.callback.borrow_mut())(&value);
        }
        // The initial call may have queued values of its own.
        if guard.is_some() {
            self.drain();
        }

        let store: Rc<dyn Detach> = self.inner.clone();
        Subscription {
            id,
            store: Rc::downgrade(&store),
        }
    }

    /// Remove the subscriber behind `handle`.
    ///
    /// No-ops when the handle was already used or belongs to another store.
    pub fn unsubscribe(&self, handle: &Subscription) {
        if std::ptr::addr_eq(handle.store.as_ptr(), Rc::as_ptr(&self.inner)) {
            self.inner.detach(handle.id);
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn drain(&self) {
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(next) = next else { break };
            *self.inner.value.borrow_mut() = next;

            let snapshot: Vec<Rc<Subscriber<T>>> = self.inner.subscribers.borrow().clone();
            trace!(store = self.inner.label, subscribers = snapshot.len(), "store fan-out");

            let value = self.inner.value.borrow();
            for subscriber in snapshot {
                if subscriber.active.get() {
                    (subscriber.callback.borrow_mut())(&value);
                }
            }
        }
    }
}

impl<T: Clone + 'static> Store<T> {
    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Set the value to `f(current)`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        // `f` may call back into this store, so no borrow is held across it.
        let next = f(&self.get());
        self.set(next);
    }
}

impl<T: Default + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.inner.label)
            .field("value", &self.inner.value.try_borrow().ok())
            .field("subscribers", &self.inner.subscribers.try_borrow().map(|s| s.len()).ok())
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Unsubscribe handle
// ────────────────────────────────────────────────────────────────────────────

trait Detach {
    fn detach(&self, id: u64);
}

impl<T> Detach for Inner<T> {
    fn detach(&self, id: u64) {
        let mut subscribers = self.subscribers.borrow_mut();
        if let Some(index) = subscribers.iter().position(|s| s.id == id) {
            let removed = subscribers.remove(index);
            // A fan-out may still hold it in its snapshot.
            removed.active.set(false);
        }
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle leaves the callback registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
pub struct Subscription {
    id: u64,
    store: Weak<dyn Detach>,
}

impl Subscription {
    /// Stop all future notifications to this callback.  Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(store) = self.store.upgrade() {
            store.detach(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch guard
// ────────────────────────────────────────────────────────────────────────────

/// Marks the store as notifying; only the outermost caller gets one.
///
/// Dropping it (also while unwinding from a panicking subscriber) re-opens
/// the store and discards values that were never delivered.
struct DispatchGuard<'a, T> {
    inner: &'a Inner<T>,
}

impl<'a, T> DispatchGuard<'a, T> {
    fn enter(inner: &'a Inner<T>) -> Option<Self> {
        if inner.dispatching.replace(true) {
            None
        } else {
            Some(Self { inner })
        }
    }
}

impl<T> Drop for DispatchGuard<'_, T> {
    fn drop(&mut self) {
        self.inner.pending.borrow_mut().clear();
        self.inner.dispatching.set(false);
    }
}
