//! Page layout: the vertical stack of content sections.
//!
//! Sections are laid out top to bottom starting at page offset zero. The
//! navigation bar is fixed and overlays the page, so it takes no space in
//! the flow.

use serde::{Deserialize, Serialize};

use crate::viewport::Rect;

/// Reveal cadence for a section's children.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaggerSpec {
    /// Number of children revealed in sequence.
    pub items: usize,
    /// Delay before the first child.
    pub delay_children_ms: f64,
    /// Delay between consecutive children.
    pub stagger_ms: f64,
}

impl StaggerSpec {
    pub fn new(items: usize, delay_children_ms: f64, stagger_ms: f64) -> Self {
        Self {
            items,
            delay_children_ms,
            stagger_ms,
        }
    }
}

/// One content section of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Anchor id (e.g. "about").
    pub id: String,

    /// Laid-out height in CSS pixels.
    pub height: f64,

    /// Visible fraction that triggers the section's reveal.
    /// `None` means the section animates as soon as it mounts.
    pub threshold: Option<f64>,

    /// Whether the reveal is sticky once triggered.
    #[serde(default = "default_once")]
    pub once: bool,

    /// Children reveal cadence.
    pub stagger: StaggerSpec,
}

fn default_once() -> bool {
    true
}

impl SectionSpec {
    /// A section revealed when `threshold` of it scrolls into view.
    pub fn observed(id: &str, height: f64, threshold: f64, stagger: StaggerSpec) -> Self {
        Self {
            id: id.to_string(),
            height,
            threshold: Some(threshold),
            once: true,
            stagger,
        }
    }

    /// A section revealed on mount.
    pub fn immediate(id: &str, height: f64, stagger: StaggerSpec) -> Self {
        Self {
            id: id.to_string(),
            height,
            threshold: None,
            once: true,
            stagger,
        }
    }
}

/// The full page: sections in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub sections: Vec<SectionSpec>,

    /// Height of the footer below the last section.
    pub footer_height: f64,
}

impl PageLayout {
    /// The portfolio page: hero, about, skills, experience, projects,
    /// education and contact, followed by the footer.
    pub fn portfolio() -> Self {
        Self {
            sections: vec![
                SectionSpec::immediate("hero", 900.0, StaggerSpec::new(6, 300.0, 200.0)),
                SectionSpec::observed("about", 1100.0, 0.2, StaggerSpec::new(8, 0.0, 150.0)),
                SectionSpec::observed("skills", 1000.0, 0.1, StaggerSpec::new(4, 0.0, 100.0)),
                SectionSpec::observed(
                    "experience",
                    1400.0,
                    0.05,
                    StaggerSpec::new(4, 0.0, 200.0),
                ),
                SectionSpec::observed("projects", 1300.0, 0.1, StaggerSpec::new(4, 0.0, 200.0)),
                SectionSpec::observed(
                    "education",
                    800.0,
                    0.2,
                    StaggerSpec::new(3, 400.0, 100.0),
                ),
                SectionSpec::observed("contact", 1000.0, 0.1, StaggerSpec::new(3, 0.0, 150.0)),
            ],
            footer_height: 240.0,
        }
    }

    /// Look up a section by id.
    pub fn section(&self, id: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Page-space rectangle of every section, in document order.
    pub fn section_rects(&self, page_width: f64) -> Vec<(&str, Rect)> {
        let mut y = 0.0;
        self.sections
            .iter()
            .map(|section| {
                let rect = Rect::new(0.0, y, page_width, section.height);
                y += section.height.max(0.0);
                (section.id.as_str(), rect)
            })
            .collect()
    }

    /// Page-space rectangle of one section.
    pub fn section_rect(&self, id: &str, page_width: f64) -> Option<Rect> {
        self.section_rects(page_width)
            .into_iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, rect)| rect)
    }

    /// Total document height including the footer.
    pub fn total_height(&self) -> f64 {
        self.sections.iter().map(|s| s.height.max(0.0)).sum::<f64>() + self.footer_height
    }

    /// Largest scroll offset reachable in a viewport of the given height.
    pub fn max_scroll(&self, viewport_height: f64) -> f64 {
        (self.total_height() - viewport_height).max(0.0)
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::portfolio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_section_order() {
        let page = PageLayout::portfolio();
        let ids: Vec<&str> = page.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "hero",
                "about",
                "skills",
                "experience",
                "projects",
                "education",
                "contact"
            ]
        );
    }

    #[test]
    fn test_sections_stack_without_gaps() {
        let page = PageLayout::portfolio();
        let rects = page.section_rects(1440.0);
        for pair in rects.windows(2) {
            assert_eq!(pair[0].1.bottom(), pair[1].1.y);
        }
        assert_eq!(page.section_rect("about", 1440.0).unwrap().y, 900.0);
        assert!(page.section_rect("blog", 1440.0).is_none());
    }

    #[test]
    fn test_max_scroll_never_negative() {
        let page = PageLayout {
            sections: vec![SectionSpec::immediate(
                "hero",
                300.0,
                StaggerSpec::new(1, 0.0, 0.0),
            )],
            footer_height: 0.0,
        };
        assert_eq!(page.max_scroll(900.0), 0.0);
        assert_eq!(PageLayout::portfolio().max_scroll(900.0), 6840.0);
    }

    #[test]
    fn test_layout_deserializes_with_default_once() {
        let json = r#"{
            "sections": [
                {"id": "about", "height": 500, "threshold": 0.2,
                 "stagger": {"items": 2, "delay_children_ms": 0, "stagger_ms": 100}}
            ],
            "footer_height": 0
        }"#;
        let page: PageLayout = serde_json::from_str(json).unwrap();
        assert!(page.sections[0].once);
        assert_eq!(page.sections[0].threshold, Some(0.2));
    }
}
