//! Folio Motion
//!
//! The motion primitives of the portfolio page, each mounted against a
//! [`folio_host::Host`] and owning its timers and registrations:
//! - **VisibilityTracker:** whether a region satisfies a visible-fraction threshold
//! - **Typewriter:** character-by-character text reveal with a blinking cursor
//! - **PointerTracker:** latest pointer position, raw and normalized
//! - **CounterAnimator:** one ease-out count-up from zero per mount
//!
//! Page-level helpers built on them:
//! - **ScrollThreshold:** the navigation bar's "scrolled past" flag
//! - **StaggeredReveal:** per-child reveal cadence of a section
//! - **Scene:** the whole page composed from a [`folio_page_model::PageLayout`]
//! - **TraceWriter:** JSONL output of scene frames
//! - **load_script:** JSONL event scripts for replay
//!
//! Unmounting (dropping) any primitive cancels everything it scheduled
//! before returning; no callback of an unmounted primitive runs afterwards.

pub mod counter;
pub mod easing;
pub mod pointer;
pub mod scene;
pub mod script;
pub mod scroll;
pub mod stagger;
pub mod trace;
pub mod typewriter;
pub mod visibility;

pub use counter::{CounterAnimator, CounterOptions};
pub use easing::Easing;
pub use pointer::{ParallaxLayer, PointerSample, PointerTracker};
pub use scene::{Scene, SceneFrame};
pub use script::load_script;
pub use scroll::ScrollThreshold;
pub use stagger::StaggeredReveal;
pub use trace::{parse_trace, TraceHeader, TraceWriter};
pub use typewriter::{Typewriter, TypewriterOptions, TypewriterState};
pub use visibility::{VisibilityOptions, VisibilityTracker};
