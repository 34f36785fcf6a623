//! Millisecond timing helpers.
//!
//! All Folio time values are `f64` milliseconds on a monotonic axis that
//! starts at zero when a host is created. This module provides utilities for:
//! - Sanitizing caller-supplied delays and durations
//! - Deriving frame intervals from a refresh rate
//! - Measuring how late a timer fired

/// Default display refresh rate used when none is configured.
pub const DEFAULT_FRAME_RATE_HZ: u32 = 60;

/// Clamp a caller-supplied delay or duration to a usable value.
///
/// Negative, NaN and infinite inputs become `0.0`. Motion is cosmetic, so
/// malformed timing is never an error.
pub fn sanitize_ms(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 {
        ms
    } else {
        0.0
    }
}

/// Interval between display refreshes at the given rate.
/// A zero rate falls back to [`DEFAULT_FRAME_RATE_HZ`].
pub fn frame_interval_ms(rate_hz: u32) -> f64 {
    let rate = if rate_hz == 0 {
        DEFAULT_FRAME_RATE_HZ
    } else {
        rate_hz
    };
    1000.0 / rate as f64
}

/// Lateness of a timer relative to its scheduled deadline.
#[derive(Debug, Clone, Copy)]
pub struct DriftMeasurement {
    /// When the timer was due (ms).
    pub scheduled_ms: f64,
    /// When the timer actually ran (ms).
    pub fired_ms: f64,
}

impl DriftMeasurement {
    /// Drift in milliseconds (positive = fired late).
    pub fn drift_ms(&self) -> f64 {
        self.fired_ms - self.scheduled_ms
    }

    /// Whether drift exceeds an acceptable threshold.
    pub fn exceeds_threshold_ms(&self, threshold_ms: f64) -> bool {
        self.drift_ms().abs() > threshold_ms
    }
}

/// Rate limiter for periodic output such as terminal redraws.
#[derive(Debug)]
pub struct RateController {
    target_interval_ms: f64,
    last_tick_ms: Option<f64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_interval_ms: frame_interval_ms(target_hz),
            last_tick_ms: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ms: f64) -> bool {
        match self.last_tick_ms {
            None => {
                self.last_tick_ms = Some(current_ms);
                true
            }
            Some(last) if current_ms >= last + self.target_interval_ms => {
                self.last_tick_ms = Some(current_ms);
                true
            }
            _ => false,
        }
    }

    /// Target interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.target_interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_ms_clamps_malformed_input() {
        assert_eq!(sanitize_ms(-250.0), 0.0);
        assert_eq!(sanitize_ms(f64::NAN), 0.0);
        assert_eq!(sanitize_ms(f64::INFINITY), 0.0);
        assert_eq!(sanitize_ms(80.0), 80.0);
    }

    #[test]
    fn test_frame_interval() {
        assert!((frame_interval_ms(60) - 16.666_666).abs() < 1e-3);
        assert_eq!(frame_interval_ms(100), 10.0);
        assert_eq!(frame_interval_ms(0), frame_interval_ms(DEFAULT_FRAME_RATE_HZ));
    }

    #[test]
    fn test_drift_measurement() {
        let drift = DriftMeasurement {
            scheduled_ms: 1000.0,
            fired_ms: 1050.0,
        };
        assert!((drift.drift_ms() - 50.0).abs() < 1e-9);
        assert!(drift.exceeds_threshold_ms(10.0));
        assert!(!drift.exceeds_threshold_ms(100.0));
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(60);
        assert!(ctrl.should_tick(0.0)); // first tick always fires
        assert!(!ctrl.should_tick(1.0)); // 1ms later, too soon
        assert!(ctrl.should_tick(17.0)); // ~17ms later (60Hz ~ 16.67ms)
    }

    proptest! {
        #[test]
        fn prop_sanitized_ms_is_finite_and_non_negative(ms in proptest::num::f64::ANY) {
            let clean = sanitize_ms(ms);
            prop_assert!(clean.is_finite());
            prop_assert!(clean >= 0.0);
        }
    }
}
