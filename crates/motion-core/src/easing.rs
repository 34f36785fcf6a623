//! Easing curves mapping linear progress to eased progress.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// `1 - (1 - p)^3`: fast start, decelerating into the target.
    #[default]
    EaseOutCubic,
    /// Cubic ease-in for the first half, ease-out for the second.
    EaseInOut,
}

impl Easing {
    /// Eased progress for `progress`, clamped to `[0, 1]`. NaN maps to 0.
    pub fn apply(self, progress: f64) -> f64 {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        match self {
            Easing::Linear => p,
            Easing::EaseOutCubic => 1.0 - (1.0 - p).powi(3),
            Easing::EaseInOut => {
                if p < 0.5 {
                    4.0 * p * p * p
                } else {
                    1.0 - (-2.0 * p + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}
