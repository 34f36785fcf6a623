//! Region visibility observation.
//!
//! A region is an opaque, host-owned slot that a consumer lays out in page
//! space. Observers watch one region each and are told whenever the
//! region's visible fraction crosses their threshold. Evaluation is not
//! synchronous with scrolling: scrolling, resizing, region layout and new
//! registrations only mark the observations dirty. Changes are computed and
//! delivered by [`Host::run_observation_pass`], which `advance_to` runs
//! before and after firing timers and which does nothing while clean.

use folio_page_model::viewport::{visible_fraction, Rect};
use slotmap::new_key_type;

use crate::{Host, WeakHost};

new_key_type! {
    /// Key of a region slot.
    pub struct RegionId;
    /// Key of an observation registration.
    pub struct ObservationId;
}

/// A delivered visibility change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationChange {
    /// Whether the region now satisfies the threshold.
    pub in_view: bool,
    /// Visible fraction at evaluation time.
    pub ratio: f64,
    /// Host time of the evaluation.
    pub time_ms: f64,
}

pub(crate) struct ObservationEntry {
    region: RegionId,
    threshold: f64,
    in_view: bool,
    /// `None` while the callback is running.
    callback: Option<Box<dyn FnMut(ObservationChange)>>,
}

/// Owner of a region slot. Dropping it removes the region; observers of a
/// removed region see it as permanently out of view.
#[derive(Debug)]
pub struct Region {
    host: WeakHost,
    id: RegionId,
}

impl Region {
    pub fn id(&self) -> RegionId {
        self.id
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        if let Some(host) = self.host.upgrade() {
            let mut inner = host.inner.borrow_mut();
            inner.regions.remove(self.id);
            inner.observations_dirty = true;
        }
    }
}

/// Owner of an observation. Dropping it stops delivery immediately.
#[derive(Debug)]
#[must_use = "dropping an ObservationHandle stops the observation"]
pub struct ObservationHandle {
    host: WeakHost,
    id: ObservationId,
}

impl ObservationHandle {
    pub fn id(&self) -> ObservationId {
        self.id
    }

    /// Stop observing. Equivalent to dropping the handle.
    pub fn disconnect(self) {}
}

impl Drop for ObservationHandle {
    fn drop(&mut self) {
        if let Some(host) = self.host.upgrade() {
            host.unobserve(self.id);
        }
    }
}

/// Whether a visible fraction satisfies a threshold. A zero threshold
/// means "any visible part".
pub fn meets_threshold(ratio: f64, threshold: f64) -> bool {
    if threshold <= 0.0 {
        ratio > 0.0
    } else {
        ratio >= threshold
    }
}

fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        0.0
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

impl Host {
    /// Allocate an empty region slot. It has no layout until
    /// [`Host::layout_region`] is called.
    pub fn create_region(&self) -> Region {
        let id = self.inner.borrow_mut().regions.insert(None);
        Region {
            host: self.downgrade(),
            id,
        }
    }

    /// Attach a region to a page-space rectangle. Returns false if the
    /// region has been removed.
    pub fn layout_region(&self, region: RegionId, rect: Rect) -> bool {
        self.set_region_layout(region, Some(rect))
    }

    /// Detach a region from the page (e.g. conditionally unrendered).
    pub fn clear_region_layout(&self, region: RegionId) -> bool {
        self.set_region_layout(region, None)
    }

    fn set_region_layout(&self, region: RegionId, rect: Option<Rect>) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.regions.get_mut(region) {
            Some(slot) => {
                *slot = rect;
                inner.observations_dirty = true;
                true
            }
            None => false,
        }
    }

    /// Whether the next observation pass has anything to re-evaluate.
    pub fn observations_dirty(&self) -> bool {
        self.inner.borrow().observations_dirty
    }

    /// Current layout of a region, if attached.
    pub fn region_rect(&self, region: RegionId) -> Option<Rect> {
        self.inner.borrow().regions.get(region).copied().flatten()
    }

    /// Visible fraction of a region right now. Unattached regions are hidden.
    pub fn visible_fraction(&self, region: RegionId) -> f64 {
        let inner = self.inner.borrow();
        inner
            .regions
            .get(region)
            .copied()
            .flatten()
            .map(|rect| visible_fraction(&rect, &inner.viewport, inner.scroll_y))
            .unwrap_or(0.0)
    }

    /// Watch `region` against `threshold` (clamped to `[0, 1]`). The
    /// observation starts out of view; `callback` hears every change.
    pub fn observe<F>(&self, region: RegionId, threshold: f64, callback: F) -> ObservationHandle
    where
        F: FnMut(ObservationChange) + 'static,
    {
        let threshold = clamp_threshold(threshold);
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.observations_dirty = true;
            inner.observations.insert(ObservationEntry {
                region,
                threshold,
                in_view: false,
                callback: Some(Box::new(callback)),
            })
        };
        tracing::trace!(?id, ?region, threshold, "Observation registered");
        ObservationHandle {
            host: self.downgrade(),
            id,
        }
    }

    /// Stop an observation by id. Returns false if it was already gone.
    pub fn unobserve(&self, id: ObservationId) -> bool {
        let removed = self.inner.borrow_mut().observations.remove(id);
        let was_present = removed.is_some();
        drop(removed);
        if was_present {
            tracing::trace!(?id, "Observation removed");
        }
        was_present
    }

    /// One evaluation cycle: if anything marked the observations dirty,
    /// compute every observation's state against the current viewport and
    /// scroll offset, then deliver the changes.
    /// Returns the number of callbacks invoked.
    pub fn run_observation_pass(&self) -> usize {
        let changes: Vec<(ObservationId, ObservationChange)> = {
            let mut guard = self.inner.borrow_mut();
            if !std::mem::take(&mut guard.observations_dirty) {
                return 0;
            }
            let inner = &*guard;
            let changes = inner
                .observations
                .iter()
                .filter_map(|(id, obs)| {
                    let ratio = inner
                        .regions
                        .get(obs.region)
                        .copied()
                        .flatten()
                        .map(|rect| visible_fraction(&rect, &inner.viewport, inner.scroll_y))
                        .unwrap_or(0.0);
                    let in_view = meets_threshold(ratio, obs.threshold);
                    (in_view != obs.in_view).then_some((
                        id,
                        ObservationChange {
                            in_view,
                            ratio,
                            time_ms: inner.now_ms,
                        },
                    ))
                })
                .collect();
            changes
        };

        let mut delivered = 0;
        for (id, change) in changes {
            let callback = {
                let mut guard = self.inner.borrow_mut();
                let inner = &mut *guard;
                let callback = match inner.observations.get_mut(id) {
                    Some(obs) if obs.callback.is_some() => {
                        obs.in_view = change.in_view;
                        obs.callback.take()
                    }
                    // Running further up the stack; re-evaluate next pass.
                    Some(_) => {
                        inner.observations_dirty = true;
                        None
                    }
                    None => None,
                };
                callback
            };
            let Some(mut callback) = callback else {
                continue;
            };

            callback(change);
            delivered += 1;

            let leftover = match self.inner.borrow_mut().observations.get_mut(id) {
                Some(obs) => {
                    obs.callback = Some(callback);
                    None
                }
                // Disconnected from inside its own callback.
                None => Some(callback),
            };
            drop(leftover);
        }
        delivered
    }
}
