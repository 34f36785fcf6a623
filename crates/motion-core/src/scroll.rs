//! Scroll offset threshold, used for the navigation bar's "scrolled" style.

use folio_host::{Host, ListenerHandle, Signal};

pub const DEFAULT_NAV_THRESHOLD_PX: f64 = 50.0;

/// True while the page is scrolled strictly past `threshold_px`.
pub struct ScrollThreshold {
    threshold_px: f64,
    scrolled: Signal<bool>,
    _listener: ListenerHandle,
}

impl ScrollThreshold {
    pub fn mount(host: &Host, threshold_px: f64) -> Self {
        let threshold_px = if threshold_px.is_finite() {
            threshold_px.max(0.0)
        } else {
            DEFAULT_NAV_THRESHOLD_PX
        };
        let scrolled = Signal::new(host.scroll_y() > threshold_px);

        let signal = scrolled.clone();
        let listener = host.on_scroll(move |scroll_y| {
            let past = scroll_y > threshold_px;
            if signal.get() != past {
                signal.set(past);
            }
        });

        Self {
            threshold_px,
            scrolled,
            _listener: listener,
        }
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled.get()
    }

    pub fn signal(&self) -> Signal<bool> {
        self.scrolled.clone()
    }

    pub fn threshold_px(&self) -> f64 {
        self.threshold_px
    }

    pub fn unmount(self) {}
}

impl std::fmt::Debug for ScrollThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollThreshold")
            .field("threshold_px", &self.threshold_px)
            .field("scrolled", &self.is_scrolled())
            .finish()
    }
}
