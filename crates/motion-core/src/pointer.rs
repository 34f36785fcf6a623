//! Pointer position tracking and the parallax mapping built on it.
//!
//! Samples are a direct passthrough of host pointer moves: no smoothing and
//! no throttling. Normalized coordinates are `client / viewport - 0.5` per
//! axis, recomputed against the viewport size at the time of each move.

use std::cell::Cell;
use std::rc::Rc;

use folio_host::{Host, ListenerHandle, Signal};
use folio_page_model::viewport::Viewport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// Raw position in viewport pixels.
    pub x: f64,
    pub y: f64,
    /// Position relative to the viewport midpoint, roughly `[-0.5, 0.5]`.
    pub normalized_x: f64,
    pub normalized_y: f64,
}

impl PointerSample {
    pub fn from_client(x: f64, y: f64, viewport: &Viewport) -> Self {
        let (normalized_x, normalized_y) = viewport.normalize(x, y);
        Self {
            x,
            y,
            normalized_x,
            normalized_y,
        }
    }

    /// The viewport center, normalized to `(0, 0)`.
    pub fn neutral(viewport: &Viewport) -> Self {
        let center = viewport.center();
        Self {
            x: center.x,
            y: center.y,
            normalized_x: 0.0,
            normalized_y: 0.0,
        }
    }
}

/// Latest pointer position while mounted.
pub struct PointerTracker {
    sample: Signal<PointerSample>,
    viewport: Rc<Cell<Viewport>>,
    _moves: ListenerHandle,
    _resizes: ListenerHandle,
}

impl PointerTracker {
    pub fn mount(host: &Host) -> Self {
        let viewport = Rc::new(Cell::new(host.viewport()));
        let sample = Signal::new(PointerSample::neutral(&viewport.get()));
        let has_sample = Rc::new(Cell::new(false));

        let move_signal = sample.clone();
        let moved = has_sample.clone();
        let moves = host.on_pointer_move(move |event| {
            moved.set(true);
            move_signal.set(PointerSample::from_client(
                event.client_x,
                event.client_y,
                &event.viewport,
            ));
        });

        let resize_signal = sample.clone();
        let current = viewport.clone();
        let resizes = host.on_resize(move |resized| {
            current.set(resized);
            // Until the first move, the neutral sample tracks the center.
            if !has_sample.get() {
                resize_signal.set(PointerSample::neutral(&resized));
            }
        });

        tracing::debug!("Pointer tracker mounted");
        Self {
            sample,
            viewport,
            _moves: moves,
            _resizes: resizes,
        }
    }

    pub fn sample(&self) -> PointerSample {
        self.sample.get()
    }

    pub fn signal(&self) -> Signal<PointerSample> {
        self.sample.clone()
    }

    /// Remove the listeners and reset the sample to neutral.
    pub fn unmount(self) {}
}

impl Drop for PointerTracker {
    fn drop(&mut self) {
        // Listeners are removed when the handle fields drop, right after
        // this; no further move can arrive in between.
        self.sample.set(PointerSample::neutral(&self.viewport.get()));
        tracing::debug!("Pointer tracker unmounted");
    }
}

impl std::fmt::Debug for PointerTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerTracker")
            .field("sample", &self.sample())
            .finish()
    }
}

/// A background layer whose gradient origin follows the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParallaxLayer {
    /// Resting position in percent of the layer box.
    pub base_x: f64,
    pub base_y: f64,
    /// Percent moved per unit of normalized pointer offset. Negative
    /// values move against the pointer.
    pub scale: f64,
}

impl ParallaxLayer {
    /// The hero's primary glow.
    pub const HERO_PRIMARY: ParallaxLayer = ParallaxLayer::new(50.0, 50.0, 10.0);
    /// The hero's counter-moving secondary glow.
    pub const HERO_SECONDARY: ParallaxLayer = ParallaxLayer::new(30.0, 70.0, -5.0);

    pub const fn new(base_x: f64, base_y: f64, scale: f64) -> Self {
        Self {
            base_x,
            base_y,
            scale,
        }
    }

    /// Gradient origin in percent for a pointer sample.
    pub fn position(&self, sample: &PointerSample) -> (f64, f64) {
        (
            self.base_x + sample.normalized_x * self.scale,
            self.base_y + sample.normalized_y * self.scale,
        )
    }
}
