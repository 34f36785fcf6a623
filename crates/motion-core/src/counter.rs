//! Ease-out count-up from zero to a target value.
//!
//! The animation starts on the first animation frame after the trigger
//! first becomes true and samples the curve once per frame until the
//! duration has elapsed. It runs at most once per mount: later trigger
//! changes, in either direction, are ignored.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use folio_common::clock::sanitize_ms;
use folio_host::{Host, Signal, Subscription, TimerHandle, WeakHost};
use serde::{Deserialize, Serialize};

use crate::easing::Easing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterOptions {
    pub end_value: u64,
    pub duration_ms: f64,
    /// Appended when rendering; not part of the animation.
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub easing: Easing,
}

impl CounterOptions {
    pub fn new(end_value: u64, duration_ms: f64) -> Self {
        Self {
            end_value,
            duration_ms,
            suffix: String::new(),
            easing: Easing::default(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Count along a different curve. Every curve is monotonic, so the
    /// displayed value still never decreases.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Displayed value `elapsed_ms` into a run: `end * ease_out_cubic(p)`
/// rounded to the nearest integer, with `p = elapsed / duration` clamped
/// to `[0, 1]`. A zero duration jumps straight to `end_value`.
pub fn value_at(end_value: u64, duration_ms: f64, elapsed_ms: f64) -> u64 {
    eased_value_at(Easing::EaseOutCubic, end_value, duration_ms, elapsed_ms)
}

/// [`value_at`] along an arbitrary curve.
pub fn eased_value_at(easing: Easing, end_value: u64, duration_ms: f64, elapsed_ms: f64) -> u64 {
    let duration_ms = sanitize_ms(duration_ms);
    let progress = if duration_ms > 0.0 {
        sanitize_ms(elapsed_ms) / duration_ms
    } else {
        1.0
    };
    let eased = easing.apply(progress);
    let value = (end_value as f64 * eased).round() as u64;
    value.min(end_value)
}

#[derive(Default)]
struct Run {
    started_at_ms: Option<f64>,
    has_started: bool,
    finished: bool,
    frame: Option<TimerHandle>,
}

struct Shared {
    host: WeakHost,
    end_value: u64,
    duration_ms: f64,
    easing: Easing,
    display: Signal<u64>,
    run: RefCell<Run>,
    unmounted: Cell<bool>,
}

/// A mounted counter.
pub struct CounterAnimator {
    shared: Rc<Shared>,
    suffix: String,
    trigger_subscription: Option<Subscription>,
}

impl CounterAnimator {
    /// Mount idle, displaying zero.
    pub fn mount(host: &Host, options: CounterOptions) -> Self {
        let shared = Rc::new(Shared {
            host: host.downgrade(),
            end_value: options.end_value,
            duration_ms: sanitize_ms(options.duration_ms),
            easing: options.easing,
            display: Signal::new(0),
            run: RefCell::new(Run::default()),
            unmounted: Cell::new(false),
        });
        tracing::debug!(
            end_value = options.end_value,
            duration_ms = shared.duration_ms,
            "Counter mounted"
        );
        Self {
            shared,
            suffix: options.suffix,
            trigger_subscription: None,
        }
    }

    /// Feed the start trigger. Only the first `true` has any effect.
    pub fn trigger(&self, active: bool) {
        if active {
            start(&self.shared);
        }
    }

    /// Start when `trigger` first reads true, now or later. Replaces any
    /// previously followed trigger.
    pub fn follow(&mut self, trigger: &Signal<bool>) {
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        self.trigger_subscription = Some(trigger.subscribe(move |active| {
            if *active {
                if let Some(shared) = weak.upgrade() {
                    start(&shared);
                }
            }
        }));
        if trigger.get() {
            start(&self.shared);
        }
    }

    pub fn display_value(&self) -> u64 {
        self.shared.display.get()
    }

    /// Value with the suffix appended, e.g. `"15+"`.
    pub fn display(&self) -> String {
        format!("{}{}", self.display_value(), self.suffix)
    }

    pub fn signal(&self) -> Signal<u64> {
        self.shared.display.clone()
    }

    pub fn end_value(&self) -> u64 {
        self.shared.end_value
    }

    pub fn has_started(&self) -> bool {
        self.shared.run.borrow().has_started
    }

    pub fn is_finished(&self) -> bool {
        self.shared.run.borrow().finished
    }

    /// Cancel any pending frame and stop following the trigger.
    pub fn unmount(self) {}
}

fn start(shared: &Rc<Shared>) {
    if shared.unmounted.get() || shared.run.borrow().has_started {
        return;
    }
    let Some(host) = shared.host.upgrade() else {
        return;
    };
    shared.run.borrow_mut().has_started = true;
    tracing::debug!(end_value = shared.end_value, "Counter started");
    request_next_frame(&host, shared);
}

fn request_next_frame(host: &Host, shared: &Rc<Shared>) {
    let weak = Rc::downgrade(shared);
    let frame = host.request_frame(move |now_ms| {
        if let Some(shared) = weak.upgrade() {
            on_frame(&shared, now_ms);
        }
    });
    let previous = shared.run.borrow_mut().frame.replace(frame);
    drop(previous);
}

fn on_frame(shared: &Rc<Shared>, now_ms: f64) {
    if shared.unmounted.get() {
        return;
    }
    let started_at = *shared.run.borrow_mut().started_at_ms.get_or_insert(now_ms);
    let elapsed = now_ms - started_at;
    let value = eased_value_at(shared.easing, shared.end_value, shared.duration_ms, elapsed);
    let done = elapsed >= shared.duration_ms;

    if done {
        let last = {
            let mut run = shared.run.borrow_mut();
            run.finished = true;
            run.frame.take()
        };
        drop(last);
        tracing::debug!(value, "Counter finished");
    } else if let Some(host) = shared.host.upgrade() {
        request_next_frame(&host, shared);
    }

    if shared.display.get() != value {
        shared.display.set(value);
    }
}

impl Drop for CounterAnimator {
    fn drop(&mut self) {
        self.shared.unmounted.set(true);
        let frame = self.shared.run.borrow_mut().frame.take();
        drop(frame);
        self.trigger_subscription.take();
        tracing::debug!(end_value = self.shared.end_value, "Counter unmounted");
    }
}

impl std::fmt::Debug for CounterAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterAnimator")
            .field("end_value", &self.shared.end_value)
            .field("display", &self.display())
            .field("has_started", &self.has_started())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_page_model::viewport::Viewport;
    use proptest::prelude::*;

    fn host() -> Host {
        // 10 ms frames keep the arithmetic readable.
        Host::new(Viewport::default(), 10.0)
    }

    #[test]
    fn test_value_at_endpoints() {
        assert_eq!(value_at(100, 2000.0, 0.0), 0);
        assert_eq!(value_at(100, 2000.0, 1000.0), 88);
        assert_eq!(value_at(100, 2000.0, 2000.0), 100);
        assert_eq!(value_at(100, 2000.0, 9000.0), 100);
        assert_eq!(value_at(100, 0.0, 0.0), 100);
        assert_eq!(value_at(100, -5.0, 0.0), 100);
    }

    #[test]
    fn test_linear_counter_follows_curve() {
        let host = host();
        let counter = CounterAnimator::mount(
            &host,
            CounterOptions::new(100, 100.0).with_easing(Easing::Linear),
        );
        counter.trigger(true);
        // Starts on the frame at 10 ms.
        host.advance_to(60.0);
        assert_eq!(counter.display_value(), 50);
        assert_eq!(eased_value_at(Easing::EaseInOut, 100, 100.0, 50.0), 50);
        host.advance_to(110.0);
        assert_eq!(counter.display_value(), 100);
    }

    #[test]
    fn test_idle_until_triggered() {
        let host = host();
        let counter = CounterAnimator::mount(&host, CounterOptions::new(100, 2000.0));
        host.advance_by(500.0);
        assert_eq!(counter.display_value(), 0);
        assert!(!counter.has_started());
        counter.trigger(false);
        assert!(!counter.has_started());
    }

    #[test]
    fn test_runs_to_end_once() {
        let host = host();
        let counter = CounterAnimator::mount(&host, CounterOptions::new(100, 2000.0));
        counter.trigger(true);
        assert!(counter.has_started());

        let mut last = 0;
        for _ in 0..250 {
            host.advance_by(10.0);
            let value = counter.display_value();
            assert!(value >= last, "{value} < {last}");
            last = value;
        }
        assert_eq!(counter.display_value(), 100);
        assert!(counter.is_finished());
        assert_eq!(host.stats().frames, 0);

        counter.trigger(false);
        counter.trigger(true);
        host.advance_by(100.0);
        assert_eq!(counter.display_value(), 100);
        assert_eq!(host.stats().frames, 0);
    }

    #[test]
    fn test_start_is_first_frame_after_trigger() {
        let host = host();
        host.advance_to(3.0);
        let counter = CounterAnimator::mount(&host, CounterOptions::new(1000, 100.0));
        counter.trigger(true);

        host.advance_to(10.0);
        assert_eq!(counter.display_value(), 0);
        host.advance_to(60.0);
        assert_eq!(counter.display_value(), value_at(1000, 100.0, 50.0));
        host.advance_to(110.0);
        assert_eq!(counter.display_value(), 1000);
        assert!(counter.is_finished());
    }

    #[test]
    fn test_mid_run_toggle_does_not_reset() {
        let host = host();
        let trigger = Signal::new(false);
        let mut counter = CounterAnimator::mount(&host, CounterOptions::new(15, 2000.0).with_suffix("+"));
        counter.follow(&trigger);

        trigger.set(true);
        host.advance_by(1000.0);
        let mid = counter.display_value();
        assert!(mid > 0 && mid < 15);

        trigger.set(false);
        host.advance_by(100.0);
        assert!(counter.display_value() >= mid);
        trigger.set(true);
        host.advance_by(2000.0);
        assert_eq!(counter.display(), "15+");
    }

    #[test]
    fn test_follow_already_true_trigger() {
        let host = host();
        let trigger = Signal::new(true);
        let mut counter = CounterAnimator::mount(&host, CounterOptions::new(4, 0.0));
        counter.follow(&trigger);
        host.advance_by(10.0);
        assert_eq!(counter.display(), "4");
    }

    #[test]
    fn test_unmount_mid_run_stops_updates() {
        let host = host();
        let counter = CounterAnimator::mount(&host, CounterOptions::new(100, 2000.0));
        let signal = counter.signal();
        counter.trigger(true);
        host.advance_by(500.0);
        let version = signal.version();
        assert!(version > 0);

        counter.unmount();
        assert!(host.stats().is_idle());
        host.advance_by(5000.0);
        assert_eq!(signal.version(), version);
    }

    proptest! {
        #[test]
        fn prop_value_is_monotonic_and_bounded(
            end in 0u64..1_000_000,
            duration in 1.0f64..10_000.0,
            a in 0.0f64..12_000.0,
            b in 0.0f64..12_000.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let v_lo = value_at(end, duration, lo);
            let v_hi = value_at(end, duration, hi);
            prop_assert!(v_lo <= v_hi);
            prop_assert!(v_hi <= end);
        }
    }
}
