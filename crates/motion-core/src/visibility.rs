//! Viewport visibility tracking for a single region.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use folio_host::{Host, ObservationHandle, Region, RegionId, Signal, WeakHost};
use folio_page_model::viewport::Rect;
use serde::{Deserialize, Serialize};

/// Threshold used when none is given: any non-trivial fraction visible.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityOptions {
    /// Visible fraction of the region that counts as in view, `[0, 1]`.
    pub threshold: f64,
    /// Stay in view after the first upward crossing.
    pub trigger_once: bool,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            trigger_once: false,
        }
    }
}

impl VisibilityOptions {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Sticky variant: true forever after the first upward crossing.
    pub fn once(threshold: f64) -> Self {
        Self {
            threshold,
            trigger_once: true,
        }
    }
}

/// Reports whether its region currently satisfies the threshold.
///
/// The tracker owns the region slot; callers attach it to the page with
/// [`VisibilityTracker::layout`]. A region that is never laid out is never
/// in view.
pub struct VisibilityTracker {
    host: WeakHost,
    region: Region,
    options: VisibilityOptions,
    in_view: Signal<bool>,
    observation: Rc<RefCell<Option<ObservationHandle>>>,
}

impl VisibilityTracker {
    pub fn mount(host: &Host, options: VisibilityOptions) -> Self {
        let threshold = if options.threshold.is_nan() {
            DEFAULT_THRESHOLD
        } else {
            options.threshold.clamp(0.0, 1.0)
        };
        let options = VisibilityOptions {
            threshold,
            ..options
        };

        let region = host.create_region();
        let in_view = Signal::new(false);
        let observation: Rc<RefCell<Option<ObservationHandle>>> = Rc::new(RefCell::new(None));

        let signal = in_view.clone();
        let slot: Weak<RefCell<Option<ObservationHandle>>> = Rc::downgrade(&observation);
        let trigger_once = options.trigger_once;
        let handle = host.observe(region.id(), threshold, move |change| {
            if change.in_view && trigger_once {
                let finished = slot.upgrade().and_then(|slot| slot.borrow_mut().take());
                drop(finished);
                tracing::debug!(ratio = change.ratio, "Region revealed; observation released");
            }
            if signal.get() != change.in_view {
                signal.set(change.in_view);
            }
        });
        *observation.borrow_mut() = Some(handle);

        tracing::debug!(
            region = ?region.id(),
            threshold,
            trigger_once,
            "Visibility tracker mounted"
        );

        Self {
            host: host.downgrade(),
            region,
            options,
            in_view,
            observation,
        }
    }

    /// The region handle to attach to a page element.
    pub fn region(&self) -> RegionId {
        self.region.id()
    }

    /// Attach the region to a page-space rectangle.
    pub fn layout(&self, rect: Rect) -> bool {
        self.host
            .upgrade()
            .is_some_and(|host| host.layout_region(self.region.id(), rect))
    }

    /// Detach the region (e.g. its element stopped rendering).
    pub fn detach(&self) -> bool {
        self.host
            .upgrade()
            .is_some_and(|host| host.clear_region_layout(self.region.id()))
    }

    pub fn is_in_view(&self) -> bool {
        self.in_view.get()
    }

    /// The in-view flag as a signal, for composing with other primitives.
    pub fn signal(&self) -> Signal<bool> {
        self.in_view.clone()
    }

    pub fn options(&self) -> VisibilityOptions {
        self.options
    }

    /// Whether the observation is still registered. A `trigger_once`
    /// tracker stops observing after its first reveal.
    pub fn is_observing(&self) -> bool {
        self.observation.borrow().is_some()
    }

    /// Tear down the observation and release the region.
    pub fn unmount(self) {}
}

impl Drop for VisibilityTracker {
    fn drop(&mut self) {
        let handle = self.observation.borrow_mut().take();
        drop(handle);
        tracing::debug!(region = ?self.region.id(), "Visibility tracker unmounted");
    }
}

impl std::fmt::Debug for VisibilityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityTracker")
            .field("region", &self.region.id())
            .field("options", &self.options)
            .field("in_view", &self.is_in_view())
            .field("observing", &self.is_observing())
            .finish()
    }
}
