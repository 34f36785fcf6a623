//! The portfolio page, composed from the motion primitives.
//!
//! A scene mounts one visibility tracker and one staggered reveal per
//! observed section, the hero's typewriter and pointer parallax, the
//! navigation bar's scroll flag and the about section's stat counters.
//! [`Scene::frame`] captures everything a renderer would read at the
//! current host time.

use folio_common::config::MotionConfig;
use folio_common::error::{FolioError, FolioResult};
use folio_host::{Host, ListenerHandle, RegionId};
use folio_page_model::page::PageLayout;
use folio_page_model::viewport::Rect;
use serde::{Deserialize, Serialize};

use crate::counter::{CounterAnimator, CounterOptions};
use crate::pointer::{ParallaxLayer, PointerSample, PointerTracker};
use crate::scroll::ScrollThreshold;
use crate::stagger::StaggeredReveal;
use crate::typewriter::{Typewriter, TypewriterOptions, TypewriterState};
use crate::visibility::{VisibilityOptions, VisibilityTracker};

/// The role line typed out under the hero heading.
pub const HERO_ROLE: &str = "React Developer";
pub const HERO_TYPE_SPEED_MS: f64 = 80.0;
pub const HERO_TYPE_DELAY_MS: f64 = 500.0;

/// Section whose visibility starts the stat counters.
pub const STATS_SECTION: &str = "about";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatSpec {
    pub label: &'static str,
    pub value: u64,
    pub suffix: &'static str,
}

pub const ABOUT_STATS: [StatSpec; 4] = [
    StatSpec {
        label: "Years Experience",
        value: 3,
        suffix: "+",
    },
    StatSpec {
        label: "Projects Completed",
        value: 15,
        suffix: "+",
    },
    StatSpec {
        label: "Companies Worked",
        value: 4,
        suffix: "",
    },
    StatSpec {
        label: "Commitment",
        value: 100,
        suffix: "%",
    },
];

/// Snapshot of the whole page at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFrame {
    #[serde(rename = "t")]
    pub time_ms: f64,
    pub scroll_y: f64,
    pub nav_scrolled: bool,
    pub hero_role: TypewriterState,
    pub pointer: PointerSample,
    /// Gradient origins of the hero background layers, in percent.
    pub parallax: Vec<(f64, f64)>,
    pub sections: Vec<SectionFrame>,
    pub stats: Vec<StatFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionFrame {
    pub id: String,
    pub in_view: bool,
    /// Children revealed so far.
    pub revealed: usize,
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatFrame {
    pub label: String,
    pub value: u64,
    pub display: String,
}

struct SectionMotion {
    id: String,
    /// `None` for sections revealed on mount.
    tracker: Option<VisibilityTracker>,
    reveal: StaggeredReveal,
}

impl SectionMotion {
    fn in_view(&self) -> bool {
        self.tracker
            .as_ref()
            .map_or(true, VisibilityTracker::is_in_view)
    }
}

struct Stat {
    label: String,
    counter: CounterAnimator,
}

pub struct Scene {
    host: Host,
    sections: Vec<SectionMotion>,
    hero_role: Typewriter,
    pointer: PointerTracker,
    parallax: [ParallaxLayer; 2],
    nav: ScrollThreshold,
    stats: Vec<Stat>,
    _relayout: ListenerHandle,
}

impl Scene {
    pub fn mount(host: &Host, layout: &PageLayout, config: &MotionConfig) -> Self {
        let viewport = host.viewport();
        let rects = layout.section_rects(viewport.width);

        let mut sections = Vec::with_capacity(layout.sections.len());
        let mut placements: Vec<(RegionId, Rect)> = Vec::new();
        for (spec, (_, rect)) in layout.sections.iter().zip(rects) {
            let mut reveal = StaggeredReveal::mount(host, spec.stagger, spec.once);
            let tracker = match spec.threshold {
                Some(threshold) => {
                    let options = if spec.once {
                        VisibilityOptions::once(threshold)
                    } else {
                        VisibilityOptions::new(threshold)
                    };
                    let tracker = VisibilityTracker::mount(host, options);
                    tracker.layout(rect);
                    placements.push((tracker.region(), rect));
                    reveal.follow(&tracker.signal());
                    Some(tracker)
                }
                None => {
                    reveal.trigger(true);
                    None
                }
            };
            sections.push(SectionMotion {
                id: spec.id.clone(),
                tracker,
                reveal,
            });
        }

        let relayout_host = host.downgrade();
        let relayout = host.on_resize(move |viewport| {
            let Some(host) = relayout_host.upgrade() else {
                return;
            };
            for (region, rect) in &placements {
                host.layout_region(*region, Rect::new(rect.x, rect.y, viewport.width, rect.h));
            }
        });

        let stats_trigger = sections
            .iter()
            .find(|s| s.id == STATS_SECTION)
            .and_then(|s| s.tracker.as_ref())
            .map(VisibilityTracker::signal);
        let stats = ABOUT_STATS
            .iter()
            .map(|stat| {
                let mut counter = CounterAnimator::mount(
                    host,
                    CounterOptions::new(stat.value, config.counter_duration_ms)
                        .with_suffix(stat.suffix),
                );
                if let Some(trigger) = &stats_trigger {
                    counter.follow(trigger);
                }
                Stat {
                    label: stat.label.to_string(),
                    counter,
                }
            })
            .collect();

        let hero_role = Typewriter::mount(
            host,
            TypewriterOptions::new(HERO_ROLE)
                .with_speed(HERO_TYPE_SPEED_MS)
                .with_delay(HERO_TYPE_DELAY_MS),
            config.cursor_blink_ms,
        );

        tracing::info!(
            sections = layout.sections.len(),
            page_height = layout.total_height(),
            "Scene mounted"
        );

        Self {
            host: host.clone(),
            sections,
            hero_role,
            pointer: PointerTracker::mount(host),
            parallax: [ParallaxLayer::HERO_PRIMARY, ParallaxLayer::HERO_SECONDARY],
            nav: ScrollThreshold::mount(host, config.nav_scroll_threshold_px),
            stats,
            _relayout: relayout,
        }
    }

    pub fn frame(&self) -> SceneFrame {
        let pointer = self.pointer.sample();
        SceneFrame {
            time_ms: self.host.now_ms(),
            scroll_y: self.host.scroll_y(),
            nav_scrolled: self.nav.is_scrolled(),
            hero_role: self.hero_role.snapshot(),
            pointer,
            parallax: self
                .parallax
                .iter()
                .map(|layer| layer.position(&pointer))
                .collect(),
            sections: self
                .sections
                .iter()
                .map(|section| SectionFrame {
                    id: section.id.clone(),
                    in_view: section.in_view(),
                    revealed: section.reveal.revealed_count(),
                    items: section.reveal.items(),
                })
                .collect(),
            stats: self
                .stats
                .iter()
                .map(|stat| StatFrame {
                    label: stat.label.clone(),
                    value: stat.counter.display_value(),
                    display: stat.counter.display(),
                })
                .collect(),
        }
    }

    /// Whether a section has been revealed. Sections without a threshold
    /// are always in view.
    pub fn section_in_view(&self, id: &str) -> FolioResult<bool> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(SectionMotion::in_view)
            .ok_or_else(|| FolioError::unknown_section(id))
    }

    pub fn hero_role(&self) -> &Typewriter {
        &self.hero_role
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn nav(&self) -> &ScrollThreshold {
        &self.nav
    }

    /// Stat counters as `(label, counter)`, in display order.
    pub fn stats(&self) -> impl Iterator<Item = (&str, &CounterAnimator)> {
        self.stats.iter().map(|s| (s.label.as_str(), &s.counter))
    }

    /// Tear down every primitive.
    pub fn unmount(self) {}
}

impl Drop for Scene {
    fn drop(&mut self) {
        tracing::info!(now_ms = self.host.now_ms(), "Scene unmounted");
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("sections", &self.sections.len())
            .field("hero_role", &self.hero_role)
            .field("nav", &self.nav)
            .finish()
    }
}
