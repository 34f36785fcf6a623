//! Viewport and region geometry.
//!
//! Rectangles live in page space (CSS pixels, origin at the top-left of the
//! document). The viewport is a window of fixed size that slides vertically
//! over page space as the page scrolls.

use serde::{Deserialize, Serialize};

/// The visible scrolling window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl Viewport {
    /// Create a viewport, clamping negative or NaN sizes to zero.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: non_negative(width),
            height: non_negative(height),
        }
    }

    /// The center point in viewport coordinates.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether either axis has collapsed to zero.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// The page-space rectangle covered by the viewport at a scroll offset.
    pub fn page_rect(&self, scroll_y: f64) -> Rect {
        Rect {
            x: 0.0,
            y: scroll_y,
            w: self.width,
            h: self.height,
        }
    }

    /// Rescale a viewport coordinate into roughly `[-0.5, 0.5]` per axis,
    /// centered on the viewport midpoint.
    ///
    /// A collapsed axis normalizes to `0.0`.
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        (normalize_axis(x, self.width), normalize_axis(y, self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1440.0, 900.0)
    }
}

/// An axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl Rect {
    /// Create a rectangle, clamping negative sizes to zero.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w: non_negative(w),
            h: non_negative(h),
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Check if a point lies inside or on the border.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Overlapping area of two rectangles, if they overlap with positive area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > left && bottom > top {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }
}

/// Fraction `[0.0, 1.0]` of `region` that the viewport shows at `scroll_y`.
///
/// This is the ratio of intersection area to region area. A zero-area region
/// counts as fully visible when it lies within the viewport, and hidden
/// otherwise. An empty viewport shows nothing.
pub fn visible_fraction(region: &Rect, viewport: &Viewport, scroll_y: f64) -> f64 {
    if viewport.is_empty() {
        return 0.0;
    }

    let window = viewport.page_rect(scroll_y);
    let area = region.area();
    if area <= 0.0 {
        let inside = window.contains(region.x, region.y)
            && window.contains(region.right(), region.bottom());
        return if inside { 1.0 } else { 0.0 };
    }

    match region.intersection(&window) {
        Some(overlap) => (overlap.area() / area).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

fn normalize_axis(value: f64, extent: f64) -> f64 {
    if extent > 0.0 && value.is_finite() {
        value / extent - 0.5
    } else {
        0.0
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
