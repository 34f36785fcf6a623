//! Observable values.
//!
//! A [`Signal`] holds the current value of some primitive's state and
//! notifies subscribers after every write. Notification is synchronous and
//! runs outside any internal borrow, so subscribers may read the signal,
//! write it, or drop their own [`Subscription`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct SubscriberId;
}

type SubscriberFn<T> = Box<dyn FnMut(&T)>;

struct SignalInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    /// `None` while the subscriber is running.
    subscribers: RefCell<SlotMap<SubscriberId, Option<SubscriberFn<T>>>>,
}

/// A shared value with change notification. Clones share the same value.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Default + Clone + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: RefCell::new(SlotMap::with_key()),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Number of writes so far.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    /// Call `callback` after every write until the subscription is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        let id = self
            .inner
            .subscribers
            .borrow_mut()
            .insert(Some(Box::new(callback)));
        let weak: Weak<SignalInner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let removed = inner.subscribers.borrow_mut().remove(id);
                    drop(removed);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn notify(&self) {
        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);

        let snapshot = self.get();
        let ids: Vec<SubscriberId> = self.inner.subscribers.borrow().keys().collect();

        for id in ids {
            // A nested write already notified everyone with a newer value.
            if self.inner.version.get() != version {
                break;
            }
            let callback = self
                .inner
                .subscribers
                .borrow_mut()
                .get_mut(id)
                .and_then(Option::take);
            let Some(mut callback) = callback else {
                continue;
            };

            callback(&snapshot);

            let leftover = match self.inner.subscribers.borrow_mut().get_mut(id) {
                Some(slot) => {
                    *slot = Some(callback);
                    None
                }
                None => Some(callback),
            };
            drop(leftover);
        }
    }
}

/// Owner of a signal subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unsubscribe now. Equivalent to dropping the subscription.
    pub fn cancel(self) {}
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
