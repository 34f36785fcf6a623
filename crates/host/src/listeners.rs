//! Pointer, scroll and resize listeners.
//!
//! Events are delivered synchronously to every listener registered at the
//! moment of dispatch. A listener removed during dispatch is skipped; one
//! added during dispatch first hears the next event.

use folio_page_model::event::{EventKind, HostEvent};
use folio_page_model::viewport::Viewport;
use slotmap::{new_key_type, SlotMap};

use crate::{Host, HostInner, WeakHost};

new_key_type! {
    /// Key of a registered listener.
    pub struct ListenerId;
}

/// A pointer-move notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMove {
    /// Pointer position in viewport pixels.
    pub client_x: f64,
    pub client_y: f64,
    /// Viewport size at the time of the move.
    pub viewport: Viewport,
}

pub(crate) struct Listener<A> {
    /// `None` while the callback is running.
    pub(crate) callback: Option<Box<dyn FnMut(A)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerKind {
    PointerMove,
    Scroll,
    Resize,
}

/// Owner of a listener registration. Dropping it removes the listener.
#[derive(Debug)]
#[must_use = "dropping a ListenerHandle removes the listener"]
pub struct ListenerHandle {
    host: WeakHost,
    kind: ListenerKind,
    id: ListenerId,
}

impl ListenerHandle {
    /// Remove now. Equivalent to dropping the handle.
    pub fn remove(self) {}
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(host) = self.host.upgrade() {
            host.remove_listener(self.kind, self.id);
        }
    }
}

impl Host {
    /// Listen for pointer moves.
    pub fn on_pointer_move<F>(&self, callback: F) -> ListenerHandle
    where
        F: FnMut(PointerMove) + 'static,
    {
        self.add_listener(ListenerKind::PointerMove, |inner| {
            inner.pointer_listeners.insert(Listener {
                callback: Some(Box::new(callback)),
            })
        })
    }

    /// Listen for scroll offset changes. The callback receives the new offset.
    pub fn on_scroll<F>(&self, callback: F) -> ListenerHandle
    where
        F: FnMut(f64) + 'static,
    {
        self.add_listener(ListenerKind::Scroll, |inner| {
            inner.scroll_listeners.insert(Listener {
                callback: Some(Box::new(callback)),
            })
        })
    }

    /// Listen for viewport resizes.
    pub fn on_resize<F>(&self, callback: F) -> ListenerHandle
    where
        F: FnMut(Viewport) + 'static,
    {
        self.add_listener(ListenerKind::Resize, |inner| {
            inner.resize_listeners.insert(Listener {
                callback: Some(Box::new(callback)),
            })
        })
    }

    /// Deliver a pointer move at viewport position `(x, y)`.
    pub fn dispatch_pointer_move(&self, x: f64, y: f64) {
        let event = PointerMove {
            client_x: x,
            client_y: y,
            viewport: self.viewport(),
        };
        dispatch(self, pointer_listeners, event);
    }

    /// Scroll the page to vertical offset `y` (clamped at zero) and notify
    /// scroll listeners. Visibility is re-evaluated on the next pass.
    pub fn scroll_to(&self, y: f64) {
        let y = if y.is_finite() { y.max(0.0) } else { 0.0 };
        {
            let mut inner = self.inner.borrow_mut();
            inner.scroll_y = y;
            inner.observations_dirty = true;
        }
        dispatch(self, scroll_listeners, y);
    }

    /// Resize the viewport and notify resize listeners.
    pub fn resize(&self, width: f64, height: f64) {
        let viewport = Viewport::new(width, height);
        {
            let mut inner = self.inner.borrow_mut();
            inner.viewport = viewport;
            inner.observations_dirty = true;
        }
        tracing::debug!(width = viewport.width, height = viewport.height, "Viewport resized");
        dispatch(self, resize_listeners, viewport);
    }

    /// Deliver a scripted event. Time is not advanced; callers advance to
    /// the event's timestamp first.
    pub fn apply_event(&self, event: &HostEvent) {
        match event.kind {
            EventKind::PointerMove { x, y } => self.dispatch_pointer_move(x, y),
            EventKind::Scroll { y } => self.scroll_to(y),
            EventKind::Resize { width, height } => self.resize(width, height),
            EventKind::Wait => {}
        }
    }

    fn add_listener(
        &self,
        kind: ListenerKind,
        insert: impl FnOnce(&mut HostInner) -> ListenerId,
    ) -> ListenerHandle {
        let id = insert(&mut *self.inner.borrow_mut());
        tracing::trace!(?kind, ?id, "Listener added");
        ListenerHandle {
            host: self.downgrade(),
            kind,
            id,
        }
    }

    fn remove_listener(&self, kind: ListenerKind, id: ListenerId) -> bool {
        // Each removed callback is dropped after the borrow ends, since it
        // may own handles that reach back into the host.
        let removed = match kind {
            ListenerKind::PointerMove => {
                let listener = self.inner.borrow_mut().pointer_listeners.remove(id);
                listener.is_some()
            }
            ListenerKind::Scroll => {
                let listener = self.inner.borrow_mut().scroll_listeners.remove(id);
                listener.is_some()
            }
            ListenerKind::Resize => {
                let listener = self.inner.borrow_mut().resize_listeners.remove(id);
                listener.is_some()
            }
        };
        if removed {
            tracing::trace!(?kind, ?id, "Listener removed");
        }
        removed
    }
}

fn pointer_listeners(inner: &mut HostInner) -> &mut SlotMap<ListenerId, Listener<PointerMove>> {
    &mut inner.pointer_listeners
}

fn scroll_listeners(inner: &mut HostInner) -> &mut SlotMap<ListenerId, Listener<f64>> {
    &mut inner.scroll_listeners
}

fn resize_listeners(inner: &mut HostInner) -> &mut SlotMap<ListenerId, Listener<Viewport>> {
    &mut inner.resize_listeners
}

fn dispatch<A: Copy>(
    host: &Host,
    select: fn(&mut HostInner) -> &mut SlotMap<ListenerId, Listener<A>>,
    event: A,
) {
    let ids: Vec<ListenerId> = select(&mut *host.inner.borrow_mut()).keys().collect();

    for id in ids {
        let callback = select(&mut *host.inner.borrow_mut())
            .get_mut(id)
            .and_then(|listener| listener.callback.take());
        let Some(mut callback) = callback else {
            continue;
        };

        callback(event);

        let leftover = match select(&mut *host.inner.borrow_mut()).get_mut(id) {
            Some(listener) => {
                listener.callback = Some(callback);
                None
            }
            // Removed while running.
            None => Some(callback),
        };
        drop(leftover);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn host() -> Host {
        Host::new(Viewport::new(1000.0, 800.0), 10.0)
    }

    #[test]
    fn test_pointer_move_carries_viewport() {
        let host = host();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_cb = seen.clone();
        let _listener = host.on_pointer_move(move |event| seen_cb.borrow_mut().push(event));

        host.dispatch_pointer_move(250.0, 100.0);
        host.resize(500.0, 400.0);
        host.dispatch_pointer_move(250.0, 100.0);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].viewport.width, 1000.0);
        assert_eq!(seen[1].viewport.width, 500.0);
    }

    #[test]
    fn test_scroll_is_clamped_and_recorded() {
        let host = host();
        let last = Rc::new(Cell::new(f64::NAN));
        let last_cb = last.clone();
        let _listener = host.on_scroll(move |y| last_cb.set(y));

        host.scroll_to(-40.0);
        assert_eq!(last.get(), 0.0);
        host.scroll_to(320.0);
        assert_eq!(last.get(), 320.0);
        assert_eq!(host.scroll_y(), 320.0);
    }

    #[test]
    fn test_removed_listener_is_silent() {
        let host = host();
        let count = Rc::new(Cell::new(0));
        let count_cb = count.clone();
        let listener = host.on_resize(move |_| count_cb.set(count_cb.get() + 1));

        host.resize(800.0, 600.0);
        listener.remove();
        host.resize(640.0, 480.0);
        assert_eq!(count.get(), 1);
        assert_eq!(host.stats().listeners, 0);
    }

    #[test]
    fn test_scripted_events_reach_listeners() {
        let host = host();
        let moves = Rc::new(Cell::new(0));
        let moves_cb = moves.clone();
        let _listener = host.on_pointer_move(move |_| moves_cb.set(moves_cb.get() + 1));

        for event in [
            HostEvent::pointer_move(0.0, 10.0, 10.0),
            HostEvent::scroll(5.0, 240.0),
            HostEvent::resize(9.0, 640.0, 480.0),
            HostEvent::wait(12.0),
        ] {
            host.apply_event(&event);
        }
        assert_eq!(moves.get(), 1);
        assert_eq!(host.scroll_y(), 240.0);
        assert_eq!(host.viewport(), Viewport::new(640.0, 480.0));
    }

    #[test]
    fn test_listener_removing_another_during_dispatch() {
        let host = host();
        let second_calls = Rc::new(Cell::new(0));
        let second_calls_cb = second_calls.clone();
        let second = Rc::new(RefCell::new(None));

        let second_slot = second.clone();
        let _first = host.on_scroll(move |_| {
            second_slot.borrow_mut().take();
        });
        *second.borrow_mut() =
            Some(host.on_scroll(move |_| second_calls_cb.set(second_calls_cb.get() + 1)));

        host.scroll_to(10.0);
        assert_eq!(second_calls.get(), 0);
    }
}
