//! Staggered reveal of a section's children.
//!
//! Child `i` becomes visible `delay_children_ms + i * stagger_ms` after the
//! trigger turns true. A sticky reveal ignores the trigger falling back to
//! false; otherwise that cancels every pending child timer and hides all
//! children again.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use folio_common::clock::sanitize_ms;
use folio_host::{Host, Signal, Subscription, TimerHandle, WeakHost};
use folio_page_model::page::StaggerSpec;

struct Shared {
    host: WeakHost,
    spec: StaggerSpec,
    sticky: bool,
    active: Cell<bool>,
    timers: RefCell<Vec<TimerHandle>>,
    visible: Signal<Vec<bool>>,
}

pub struct StaggeredReveal {
    shared: Rc<Shared>,
    trigger_subscription: Option<Subscription>,
}

impl StaggeredReveal {
    pub fn mount(host: &Host, spec: StaggerSpec, sticky: bool) -> Self {
        Self {
            shared: Rc::new(Shared {
                host: host.downgrade(),
                spec,
                sticky,
                active: Cell::new(false),
                timers: RefCell::new(Vec::new()),
                visible: Signal::new(vec![false; spec.items]),
            }),
            trigger_subscription: None,
        }
    }

    pub fn trigger(&self, active: bool) {
        set_active(&self.shared, active);
    }

    /// Drive the reveal from a signal, starting from its current value.
    pub fn follow(&mut self, trigger: &Signal<bool>) {
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        self.trigger_subscription = Some(trigger.subscribe(move |active| {
            if let Some(shared) = weak.upgrade() {
                set_active(&shared, *active);
            }
        }));
        set_active(&self.shared, trigger.get());
    }

    /// Delay of child `index` after the trigger.
    pub fn child_delay_ms(&self, index: usize) -> f64 {
        child_delay_ms(&self.shared.spec, index)
    }

    pub fn is_child_visible(&self, index: usize) -> bool {
        self.shared
            .visible
            .with(|visible| visible.get(index).copied().unwrap_or(false))
    }

    pub fn revealed_count(&self) -> usize {
        self.shared
            .visible
            .with(|visible| visible.iter().filter(|v| **v).count())
    }

    pub fn items(&self) -> usize {
        self.shared.spec.items
    }

    pub fn signal(&self) -> Signal<Vec<bool>> {
        self.shared.visible.clone()
    }

    pub fn unmount(self) {}
}

fn child_delay_ms(spec: &StaggerSpec, index: usize) -> f64 {
    sanitize_ms(spec.delay_children_ms) + index as f64 * sanitize_ms(spec.stagger_ms)
}

fn set_active(shared: &Rc<Shared>, active: bool) {
    if active == shared.active.get() {
        return;
    }
    if active {
        let Some(host) = shared.host.upgrade() else {
            return;
        };
        shared.active.set(true);
        let timers: Vec<TimerHandle> = (0..shared.spec.items)
            .map(|index| {
                let weak = Rc::downgrade(shared);
                host.set_timeout(child_delay_ms(&shared.spec, index), move |_| {
                    if let Some(shared) = weak.upgrade() {
                        shared.visible.update(|visible| visible[index] = true);
                    }
                })
            })
            .collect();
        let finished = std::mem::replace(&mut *shared.timers.borrow_mut(), timers);
        drop(finished);
        tracing::debug!(items = shared.spec.items, "Staggered reveal started");
    } else if !shared.sticky {
        shared.active.set(false);
        let pending = std::mem::take(&mut *shared.timers.borrow_mut());
        drop(pending);
        if shared.visible.with(|visible| visible.iter().any(|v| *v)) {
            shared.visible.update(|visible| visible.fill(false));
        }
        tracing::debug!("Staggered reveal reset");
    }
}

impl Drop for StaggeredReveal {
    fn drop(&mut self) {
        self.trigger_subscription.take();
        let pending = std::mem::take(&mut *self.shared.timers.borrow_mut());
        drop(pending);
    }
}

impl std::fmt::Debug for StaggeredReveal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaggeredReveal")
            .field("spec", &self.shared.spec)
            .field("sticky", &self.shared.sticky)
            .field("revealed", &self.revealed_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_page_model::viewport::Viewport;

    fn host() -> Host {
        Host::new(Viewport::default(), 16.0)
    }

    #[test]
    fn test_children_follow_cadence() {
        let host = host();
        let reveal = StaggeredReveal::mount(&host, StaggerSpec::new(3, 400.0, 100.0), true);
        reveal.trigger(true);
        assert_eq!(reveal.child_delay_ms(2), 600.0);

        host.advance_to(399.0);
        assert_eq!(reveal.revealed_count(), 0);
        host.advance_to(400.0);
        assert!(reveal.is_child_visible(0));
        assert!(!reveal.is_child_visible(1));
        host.advance_to(600.0);
        assert_eq!(reveal.revealed_count(), 3);
        assert!(!reveal.is_child_visible(7));
    }

    #[test]
    fn test_sticky_ignores_untrigger() {
        let host = host();
        let reveal = StaggeredReveal::mount(&host, StaggerSpec::new(4, 0.0, 100.0), true);
        reveal.trigger(true);
        host.advance_by(150.0);
        reveal.trigger(false);
        host.advance_by(500.0);
        assert_eq!(reveal.revealed_count(), 4);
    }

    #[test]
    fn test_untrigger_cancels_and_hides() {
        let host = host();
        let mut reveal = StaggeredReveal::mount(&host, StaggerSpec::new(4, 0.0, 100.0), false);
        let trigger = Signal::new(false);
        reveal.follow(&trigger);

        trigger.set(true);
        host.advance_by(150.0);
        assert_eq!(reveal.revealed_count(), 2);

        trigger.set(false);
        assert_eq!(reveal.revealed_count(), 0);
        assert_eq!(host.stats().timeouts, 0);
        host.advance_by(1000.0);
        assert_eq!(reveal.revealed_count(), 0);

        trigger.set(true);
        host.advance_by(0.0);
        assert_eq!(reveal.revealed_count(), 1);
    }

    #[test]
    fn test_unmount_cancels_pending_children() {
        let host = host();
        let reveal = StaggeredReveal::mount(&host, StaggerSpec::new(5, 0.0, 200.0), true);
        let signal = reveal.signal();
        reveal.trigger(true);
        host.advance_by(10.0);
        reveal.unmount();
        assert!(host.stats().is_idle());
        host.advance_by(2000.0);
        assert_eq!(signal.get().iter().filter(|v| **v).count(), 1);
    }
}
