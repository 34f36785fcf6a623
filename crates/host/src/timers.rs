//! Timeouts, intervals and animation frames.
//!
//! All three share one queue ordered by `(due_ms, seq)`. Frames are due on
//! the first frame boundary (`k * frame_interval_ms`) strictly after the
//! request, so a frame requested from inside a frame callback runs on the
//! following boundary.

use folio_common::clock::sanitize_ms;
use slotmap::new_key_type;

use crate::{Host, WeakHost};

new_key_type! {
    /// Key of a registered timer.
    pub struct TimerId;
}

/// Shortest allowed interval period.
pub const MIN_INTERVAL_MS: f64 = 1.0;

pub(crate) type TimerCallback = Box<dyn FnMut(f64)>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TimerKind {
    Timeout,
    Interval { period_ms: f64 },
    Frame,
}

pub(crate) struct TimerEntry {
    pub(crate) due_ms: f64,
    pub(crate) seq: u64,
    pub(crate) kind: TimerKind,
    /// `None` while the callback is running.
    pub(crate) callback: Option<TimerCallback>,
}

/// Owner of a scheduled timer. Dropping it cancels the timer.
#[derive(Debug)]
#[must_use = "dropping a TimerHandle cancels the timer"]
pub struct TimerHandle {
    host: WeakHost,
    id: TimerId,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Whether the timer is still scheduled. One-shot timers become
    /// inactive once they have fired.
    pub fn is_active(&self) -> bool {
        self.host
            .upgrade()
            .map(|host| host.inner.borrow().timers.contains_key(self.id))
            .unwrap_or(false)
    }

    /// Cancel now. Equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(host) = self.host.upgrade() {
            host.cancel_timer(self.id);
        }
    }
}

impl Host {
    /// Run `callback` once after `delay_ms`. A zero delay still waits for
    /// the next `advance_to`; it never runs synchronously.
    pub fn set_timeout<F>(&self, delay_ms: f64, callback: F) -> TimerHandle
    where
        F: FnOnce(f64) + 'static,
    {
        let due = self.now_ms() + sanitize_ms(delay_ms);
        let mut callback = Some(callback);
        self.schedule(
            due,
            TimerKind::Timeout,
            Box::new(move |now| {
                if let Some(callback) = callback.take() {
                    callback(now);
                }
            }),
        )
    }

    /// Run `callback` every `period_ms` (at least [`MIN_INTERVAL_MS`]),
    /// first at `now + period_ms`. Deadlines advance by exactly one period
    /// per fire, so intervals do not drift.
    pub fn set_interval<F>(&self, period_ms: f64, callback: F) -> TimerHandle
    where
        F: FnMut(f64) + 'static,
    {
        let period_ms = sanitize_ms(period_ms).max(MIN_INTERVAL_MS);
        let due = self.now_ms() + period_ms;
        self.schedule(due, TimerKind::Interval { period_ms }, Box::new(callback))
    }

    /// Run `callback` on the next animation frame with the frame timestamp.
    pub fn request_frame<F>(&self, callback: F) -> TimerHandle
    where
        F: FnOnce(f64) + 'static,
    {
        let due = {
            let inner = self.inner.borrow();
            next_frame_boundary(inner.now_ms, inner.frame_interval_ms)
        };
        let mut callback = Some(callback);
        self.schedule(
            due,
            TimerKind::Frame,
            Box::new(move |now| {
                if let Some(callback) = callback.take() {
                    callback(now);
                }
            }),
        )
    }

    /// Cancel a timer by id. Returns false if it already fired or was cancelled.
    pub fn cancel_timer(&self, id: TimerId) -> bool {
        let removed = self.inner.borrow_mut().timers.remove(id);
        let cancelled = removed.is_some();
        // The callback may own other handles; drop it outside the borrow.
        drop(removed);
        if cancelled {
            tracing::trace!(?id, "Timer cancelled");
        }
        cancelled
    }

    /// Deadline of the earliest pending timer.
    pub fn next_due_ms(&self) -> Option<f64> {
        self.inner
            .borrow()
            .timers
            .values()
            .filter(|entry| entry.callback.is_some())
            .map(|entry| entry.due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }

    fn schedule(&self, due_ms: f64, kind: TimerKind, callback: TimerCallback) -> TimerHandle {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let seq = inner.bump_seq();
            inner.timers.insert(TimerEntry {
                due_ms,
                seq,
                kind,
                callback: Some(callback),
            })
        };
        tracing::trace!(?id, ?kind, due_ms, "Timer scheduled");
        TimerHandle {
            host: self.downgrade(),
            id,
        }
    }

    /// Fire the earliest timer due at or before `target_ms`.
    /// Returns false when nothing is due.
    pub(crate) fn fire_next_due(&self, target_ms: f64) -> bool {
        let next = {
            let inner = self.inner.borrow();
            inner
                .timers
                .iter()
                .filter(|(_, entry)| entry.callback.is_some() && entry.due_ms <= target_ms)
                .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)))
                .map(|(id, entry)| (id, entry.due_ms))
        };
        let Some((id, due_ms)) = next else {
            return false;
        };

        let (mut callback, now_ms) = {
            let mut inner = self.inner.borrow_mut();
            if due_ms > inner.now_ms {
                inner.now_ms = due_ms;
            }
            let now_ms = inner.now_ms;
            match inner.timers.get_mut(id).and_then(|entry| entry.callback.take()) {
                Some(callback) => (callback, now_ms),
                None => return true,
            }
        };

        callback(now_ms);

        let leftover = {
            let mut inner = self.inner.borrow_mut();
            match inner.timers.get(id).map(|entry| entry.kind) {
                Some(TimerKind::Interval { period_ms }) => {
                    let seq = inner.bump_seq();
                    if let Some(entry) = inner.timers.get_mut(id) {
                        entry.due_ms += period_ms;
                        entry.seq = seq;
                        entry.callback = Some(callback);
                    }
                    None
                }
                Some(_) => {
                    inner.timers.remove(id);
                    Some(callback)
                }
                // Cancelled while running.
                None => Some(callback),
            }
        };
        drop(leftover);
        true
    }
}

fn next_frame_boundary(now_ms: f64, interval_ms: f64) -> f64 {
    // The epsilon keeps a request made exactly on a boundary from landing
    // on that same boundary through rounding.
    let index = (now_ms / interval_ms + 1e-9).floor() + 1.0;
    index * interval_ms
}
