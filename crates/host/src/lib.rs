//! Folio Host
//!
//! The host owns every timing and observation facility the motion
//! primitives use, as explicit per-instance resources:
//! - **Timers:** one-shot timeouts, fixed-period intervals, animation frames
//! - **Listeners:** pointer-move, scroll and resize notifications
//! - **Observation:** region visibility against the scrolling viewport
//! - **Signals:** shared values with change subscriptions
//!
//! Every registration returns an RAII handle. Dropping the handle (or
//! calling its `cancel`) removes the registration synchronously, so a
//! callback can never run after its owner has been torn down.
//!
//! The host is single-threaded and deterministic: time only moves when
//! [`Host::advance_to`] is called, either by tests or by the tokio driver
//! in [`realtime`].

pub mod listeners;
pub mod observe;
pub mod realtime;
pub mod signal;
pub mod timers;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use folio_common::clock::{frame_interval_ms, sanitize_ms};
use folio_common::config::MotionConfig;
use folio_page_model::viewport::{Rect, Viewport};
use slotmap::SlotMap;

pub use listeners::{ListenerHandle, ListenerId, PointerMove};
pub use observe::{ObservationChange, ObservationHandle, ObservationId, Region, RegionId};
pub use realtime::{run_realtime, RealtimeOptions};
pub use signal::{Signal, Subscription};
pub use timers::{TimerHandle, TimerId, MIN_INTERVAL_MS};

/// Upper bound on callbacks fired by one `advance_to` call. Guards against
/// zero-delay timers that reschedule themselves forever.
const MAX_FIRES_PER_ADVANCE: usize = 1_000_000;

pub(crate) struct HostInner {
    pub(crate) now_ms: f64,
    pub(crate) frame_interval_ms: f64,
    pub(crate) viewport: Viewport,
    pub(crate) scroll_y: f64,
    pub(crate) next_seq: u64,
    pub(crate) advancing: bool,
    /// Set by anything that can change an observation's outcome; cleared by
    /// the next observation pass.
    pub(crate) observations_dirty: bool,
    pub(crate) timers: SlotMap<TimerId, timers::TimerEntry>,
    pub(crate) pointer_listeners: SlotMap<ListenerId, listeners::Listener<PointerMove>>,
    pub(crate) scroll_listeners: SlotMap<ListenerId, listeners::Listener<f64>>,
    pub(crate) resize_listeners: SlotMap<ListenerId, listeners::Listener<Viewport>>,
    pub(crate) regions: SlotMap<RegionId, Option<Rect>>,
    pub(crate) observations: SlotMap<ObservationId, observe::ObservationEntry>,
}

impl HostInner {
    pub(crate) fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Counts of live registrations, for leak checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub timeouts: usize,
    pub intervals: usize,
    pub frames: usize,
    pub listeners: usize,
    pub regions: usize,
    pub observations: usize,
}

impl HostStats {
    /// True when no timer, listener or observation is registered.
    /// Regions are layout, not activity, and are not counted.
    pub fn is_idle(&self) -> bool {
        self.timeouts == 0
            && self.intervals == 0
            && self.frames == 0
            && self.listeners == 0
            && self.observations == 0
    }
}

/// A single-threaded scheduling host. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Host {
    pub(crate) inner: Rc<RefCell<HostInner>>,
}

/// Non-owning reference to a [`Host`], held by handles and callbacks.
#[derive(Clone)]
pub struct WeakHost {
    inner: Weak<RefCell<HostInner>>,
}

impl WeakHost {
    pub fn upgrade(&self) -> Option<Host> {
        self.inner.upgrade().map(|inner| Host { inner })
    }
}

impl std::fmt::Debug for WeakHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakHost")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("now_ms", &self.now_ms())
            .field("viewport", &self.viewport())
            .field("scroll_y", &self.scroll_y())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Host {
    /// Create a host at time zero with the given viewport and frame interval.
    pub fn new(viewport: Viewport, frame_interval_ms: f64) -> Self {
        let frame_interval_ms = if sanitize_ms(frame_interval_ms) > 0.0 {
            frame_interval_ms
        } else {
            folio_common::clock::frame_interval_ms(0)
        };

        Self {
            inner: Rc::new(RefCell::new(HostInner {
                now_ms: 0.0,
                frame_interval_ms,
                viewport,
                scroll_y: 0.0,
                next_seq: 0,
                advancing: false,
                observations_dirty: false,
                timers: SlotMap::with_key(),
                pointer_listeners: SlotMap::with_key(),
                scroll_listeners: SlotMap::with_key(),
                resize_listeners: SlotMap::with_key(),
                regions: SlotMap::with_key(),
                observations: SlotMap::with_key(),
            })),
        }
    }

    /// Create a host from configured viewport size and refresh rate.
    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(
            Viewport::new(config.viewport_width, config.viewport_height),
            frame_interval_ms(config.frame_rate_hz),
        )
    }

    pub fn downgrade(&self) -> WeakHost {
        WeakHost {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Current host time in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.inner.borrow().now_ms
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.inner.borrow().frame_interval_ms
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    pub fn scroll_y(&self) -> f64 {
        self.inner.borrow().scroll_y
    }

    /// Snapshot of live registrations.
    pub fn stats(&self) -> HostStats {
        let inner = self.inner.borrow();
        let mut stats = HostStats {
            listeners: inner.pointer_listeners.len()
                + inner.scroll_listeners.len()
                + inner.resize_listeners.len(),
            regions: inner.regions.len(),
            observations: inner.observations.len(),
            ..HostStats::default()
        };
        for entry in inner.timers.values() {
            match entry.kind {
                timers::TimerKind::Timeout => stats.timeouts += 1,
                timers::TimerKind::Interval { .. } => stats.intervals += 1,
                timers::TimerKind::Frame => stats.frames += 1,
            }
        }
        stats
    }

    /// Advance time by `ms` (negative values are treated as zero).
    pub fn advance_by(&self, ms: f64) {
        let target = self.now_ms() + sanitize_ms(ms);
        self.advance_to(target);
    }

    /// Advance time to `target_ms`, firing every timer and frame due on the
    /// way in deadline order (ties in registration order). Each callback
    /// runs to completion before the next one starts and sees the host
    /// clock set to its own deadline.
    ///
    /// An observation pass runs before and after the timers.
    /// Re-entrant calls from inside a callback are ignored.
    pub fn advance_to(&self, target_ms: f64) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.advancing {
                tracing::warn!(target_ms, "Ignoring re-entrant advance_to");
                return;
            }
            inner.advancing = true;
        }

        self.run_observation_pass();

        let mut fired = 0usize;
        while self.fire_next_due(target_ms) {
            fired += 1;
            if fired >= MAX_FIRES_PER_ADVANCE {
                tracing::warn!(fired, "Timer storm; stopping this advance early");
                break;
            }
        }

        {
            let mut inner = self.inner.borrow_mut();
            if target_ms > inner.now_ms {
                inner.now_ms = target_ms;
            }
            inner.advancing = false;
        }

        self.run_observation_pass();

        if fired > 0 {
            tracing::trace!(fired, now_ms = target_ms, "Host advanced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn host() -> Host {
        Host::new(Viewport::new(1000.0, 800.0), 10.0)
    }

    #[test]
    fn test_advance_moves_clock() {
        let host = host();
        host.advance_by(25.0);
        assert_eq!(host.now_ms(), 25.0);
        host.advance_by(-10.0);
        assert_eq!(host.now_ms(), 25.0);
        host.advance_to(5.0);
        assert_eq!(host.now_ms(), 25.0);
    }

    #[test]
    fn test_stats_track_registrations() {
        let host = host();
        let timeout = host.set_timeout(10.0, |_| {});
        let interval = host.set_interval(10.0, |_| {});
        let frame = host.request_frame(|_| {});
        let listener = host.on_scroll(|_| {});

        let stats = host.stats();
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.intervals, 1);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.listeners, 1);
        assert!(!stats.is_idle());

        drop((timeout, interval, frame, listener));
        assert!(host.stats().is_idle());
    }

    #[test]
    fn test_reentrant_advance_is_ignored() {
        let host = host();
        let weak = host.downgrade();
        let fired = Rc::new(Cell::new(0));
        let fired_in_cb = fired.clone();
        let _timer = host.set_timeout(10.0, move |_| {
            fired_in_cb.set(fired_in_cb.get() + 1);
            if let Some(host) = weak.upgrade() {
                host.advance_by(1000.0);
            }
        });

        host.advance_by(20.0);
        assert_eq!(fired.get(), 1);
        assert_eq!(host.now_ms(), 20.0);
    }

    #[test]
    fn test_from_config_uses_refresh_rate() {
        let config = MotionConfig {
            frame_rate_hz: 100,
            ..MotionConfig::default()
        };
        let host = Host::from_config(&config);
        assert_eq!(host.frame_interval_ms(), 10.0);
        assert_eq!(host.viewport(), Viewport::new(1440.0, 900.0));
    }
}
