//! Folio Page Model
//!
//! Defines the data contracts shared by the host and the motion primitives:
//! - **Viewport:** Viewport size, page-space rectangles, visible fractions
//! - **Events:** Timestamped host events (pointer, scroll, resize) as JSONL
//! - **Page:** Vertical section layout of the portfolio page
//!
//! Geometry is expressed in CSS pixels in page space; the viewport is the
//! window onto that space at the current scroll offset.

pub mod event;
pub mod page;
pub mod viewport;

pub use event::*;
pub use page::*;
pub use viewport::*;
