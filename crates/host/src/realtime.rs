//! Wall-clock driver for the host.
//!
//! The host itself only moves when told to. [`run_realtime`] ties it to
//! `tokio::time`: every tick it advances the host to the monotonic time
//! elapsed since the driver started, so host timers never accumulate drift
//! and fire at most one tick late.

use std::ops::ControlFlow;
use std::time::Duration;

use folio_common::clock::DriftMeasurement;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::Host;

/// Driver settings.
#[derive(Debug, Clone)]
pub struct RealtimeOptions {
    /// How often the host is advanced.
    pub tick: Duration,
    /// Stop after this much wall time. `None` runs until `on_tick` breaks.
    pub run_for: Option<Duration>,
    /// Timers firing later than this are logged at debug level.
    pub drift_log_threshold_ms: f64,
}

impl Default for RealtimeOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_micros(16_667),
            run_for: None,
            drift_log_threshold_ms: 20.0,
        }
    }
}

impl RealtimeOptions {
    /// Tick once per host animation frame.
    pub fn for_host(host: &Host) -> Self {
        Self {
            tick: Duration::from_secs_f64(host.frame_interval_ms() / 1000.0),
            ..Self::default()
        }
    }
}

/// Drive `host` in real time until `on_tick` returns `Break` or
/// `run_for` elapses. `on_tick` runs after each advance.
/// Returns the host time when the driver stopped.
pub async fn run_realtime<F>(host: &Host, options: RealtimeOptions, mut on_tick: F) -> f64
where
    F: FnMut(&Host) -> ControlFlow<()>,
{
    let tick = if options.tick.is_zero() {
        RealtimeOptions::default().tick
    } else {
        options.tick
    };
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let start = Instant::now();
    let base_ms = host.now_ms();
    let mut ticks = 0u64;

    tracing::debug!(
        tick_ms = tick.as_secs_f64() * 1000.0,
        run_for_ms = options.run_for.map(|d| d.as_secs_f64() * 1000.0),
        "Real-time driver started"
    );

    loop {
        ticker.tick().await;
        let elapsed = start.elapsed();
        let finished = options.run_for.is_some_and(|limit| elapsed >= limit);
        let elapsed = match options.run_for {
            Some(limit) if finished => limit,
            _ => elapsed,
        };
        let target_ms = base_ms + elapsed.as_secs_f64() * 1000.0;

        if let Some(due_ms) = host.next_due_ms() {
            let drift = DriftMeasurement {
                scheduled_ms: due_ms,
                fired_ms: target_ms,
            };
            if due_ms <= target_ms && drift.exceeds_threshold_ms(options.drift_log_threshold_ms) {
                tracing::debug!(
                    scheduled_ms = drift.scheduled_ms,
                    fired_ms = drift.fired_ms,
                    drift_ms = drift.drift_ms(),
                    "Timer running late"
                );
            }
        }

        host.advance_to(target_ms);
        ticks += 1;

        if on_tick(host).is_break() || finished {
            break;
        }
    }

    tracing::debug!(ticks, now_ms = host.now_ms(), "Real-time driver stopped");
    host.now_ms()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_page_model::viewport::Viewport;
    use std::cell::Cell;
    use std::rc::Rc;

    fn host() -> Host {
        Host::new(Viewport::new(800.0, 600.0), 10.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_for_the_requested_duration() {
        let host = host();
        let fired = Rc::new(Cell::new(None));
        let fired_cb = fired.clone();
        let _timer = host.set_timeout(55.0, move |now| fired_cb.set(Some(now)));

        let options = RealtimeOptions {
            tick: Duration::from_millis(10),
            run_for: Some(Duration::from_millis(100)),
            ..RealtimeOptions::for_host(&host)
        };
        let end = run_realtime(&host, options, |_| ControlFlow::Continue(())).await;

        assert_eq!(end, 100.0);
        assert_eq!(fired.get(), Some(55.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_tick_can_stop_the_driver() {
        let host = host();
        let ticks = Rc::new(Cell::new(0));
        let ticks_cb = ticks.clone();
        let options = RealtimeOptions {
            tick: Duration::from_millis(10),
            ..RealtimeOptions::default()
        };
        run_realtime(&host, options, move |_| {
            ticks_cb.set(ticks_cb.get() + 1);
            if ticks_cb.get() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await;

        assert_eq!(ticks.get(), 3);
        assert!(host.now_ms() >= 20.0);
    }

    #[test]
    fn test_options_follow_frame_interval() {
        let host = host();
        assert_eq!(RealtimeOptions::for_host(&host).tick, Duration::from_millis(10));
    }
}
