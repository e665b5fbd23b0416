//! Accessibility & ARIA audit.
//!
//! Contrast is approximated: an element is flagged when its computed text
//! color is exactly equal to its background color.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    Collected, CollectionResult, Collector, Finding, ModuleDescriptor, PageContext,
    ScoringResult, Scorer,
};

pub const NAME: &str = "accessibility";
pub const TITLE: &str = "Accessibility & ARIA Audit";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessibilityConfig {
    /// Colors never reported as contrast issues.
    pub ignored_colors: Vec<String>,
}

impl Default for AccessibilityConfig {
    fn default() -> Self {
        Self {
            ignored_colors: vec!["rgba(0, 0, 0, 0)".to_string(), "transparent".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorSample {
    pub tag: String,
    pub color: String,
    pub background_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessibilitySnapshot {
    pub images: usize,
    pub images_missing_alt: usize,
    /// Heading levels in document order.
    pub heading_levels: Vec<u8>,
    pub aria_roles: usize,
    pub colors: Vec<ColorSample>,
}

impl AccessibilitySnapshot {
    pub fn h1_count(&self) -> usize {
        self.heading_levels.iter().filter(|&&l| l == 1).count()
    }

    /// Places where a heading goes more than one level deeper than the
    /// previous one, e.g. H1 followed by H3.
    pub fn skipped_levels(&self) -> usize {
        self.heading_levels
            .windows(2)
            .filter(|w| w[1] > w[0] + 1)
            .count()
    }
}

pub struct AccessibilityCollector;

#[async_trait]
impl Collector for AccessibilityCollector {
    type Raw = AccessibilitySnapshot;

    async fn collect(
        &self,
        ctx: &dyn PageContext,
    ) -> CollectionResult<Collected<AccessibilitySnapshot>> {
        let doc = ctx.document();
        let colors = doc
            .elements
            .iter()
            .filter_map(|el| match (&el.color, &el.background_color) {
                (Some(color), Some(bg)) => Some(ColorSample {
                    tag: el.tag.clone(),
                    color: color.clone(),
                    background_color: bg.clone(),
                }),
                _ => None,
            })
            .collect();

        Ok(Collected::complete(AccessibilitySnapshot {
            images: doc.images.len(),
            images_missing_alt: doc.images.iter().filter(|i| i.lacks_alt()).count(),
            heading_levels: doc.headings().filter_map(|h| h.heading_level()).collect(),
            aria_roles: doc.elements_with_role().count(),
            colors,
        }))
    }
}

pub struct AccessibilityScorer {
    config: AccessibilityConfig,
}

impl AccessibilityScorer {
    fn contrast_issues(&self, raw: &AccessibilitySnapshot) -> usize {
        raw.colors
            .iter()
            .filter(|s| s.color == s.background_color)
            .filter(|s| !self.config.ignored_colors.iter().any(|c| c == &s.color))
            .count()
    }
}

impl Scorer for AccessibilityScorer {
    type Raw = AccessibilitySnapshot;

    fn score(&self, raw: &AccessibilitySnapshot) -> ScoringResult<Vec<Finding>> {
        let mut findings = Vec::new();

        if raw.images_missing_alt > 0 {
            findings.push(
                Finding::warn(
                    "images-missing-alt",
                    format!(
                        "{} of {} image(s) lack alt text",
                        raw.images_missing_alt, raw.images
                    ),
                )
                .with_metric("imagesMissingAlt", raw.images_missing_alt)
                .with_metric("images", raw.images),
            );
        }

        let h1 = raw.h1_count();
        if h1 == 0 {
            findings.push(Finding::warn("missing-h1", "Page has no H1 heading"));
        } else if h1 > 1 {
            findings.push(
                Finding::info("multiple-h1", format!("Page has {h1} H1 headings"))
                    .with_metric("h1Count", h1),
            );
        }

        let skipped = raw.skipped_levels();
        if skipped > 0 {
            findings.push(
                Finding::info(
                    "heading-level-skipped",
                    "Heading hierarchy skips levels; keep H1, H2, H3 in sequence",
                )
                .with_metric("skips", skipped),
            );
        }

        if raw.aria_roles == 0 {
            findings.push(Finding::info(
                "no-aria-roles",
                "No elements carry ARIA roles; label interactive components",
            ));
        }

        let contrast = self.contrast_issues(raw);
        if contrast > 0 {
            findings.push(
                Finding::warn(
                    "color-contrast",
                    format!("{contrast} element(s) use the same text and background color"),
                )
                .with_metric("elements", contrast),
            );
        }

        Ok(findings)
    }
}

pub fn descriptor(config: &AccessibilityConfig) -> ModuleDescriptor {
    ModuleDescriptor::new(
        AccessibilityCollector,
        AccessibilityScorer {
            config: config.clone(),
        },
    )
    .with_title(TITLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitediag_core::fakes::FakeContext;
    use sitediag_core::{Document, Element, Image};

    fn scorer() -> AccessibilityScorer {
        AccessibilityScorer {
            config: AccessibilityConfig::default(),
        }
    }

    fn ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.id()).collect()
    }

    fn sample(color: &str, bg: &str) -> ColorSample {
        ColorSample {
            tag: "p".into(),
            color: color.into(),
            background_color: bg.into(),
        }
    }

    #[test]
    fn test_well_structured_page_is_clean() {
        let raw = AccessibilitySnapshot {
            images: 2,
            heading_levels: vec![1, 2, 3, 2],
            aria_roles: 4,
            colors: vec![sample("rgb(0, 0, 0)", "rgb(255, 255, 255)")],
            ..Default::default()
        };
        assert!(scorer().score(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_empty_page_findings() {
        let findings = scorer().score(&AccessibilitySnapshot::default()).unwrap();
        assert_eq!(ids(&findings), vec!["missing-h1", "no-aria-roles"]);
    }

    #[test]
    fn test_structure_problems() {
        let raw = AccessibilitySnapshot {
            images: 3,
            images_missing_alt: 2,
            heading_levels: vec![1, 3, 1, 4],
            aria_roles: 1,
            colors: vec![
                sample("rgb(10, 10, 10)", "rgb(10, 10, 10)"),
                sample("rgba(0, 0, 0, 0)", "rgba(0, 0, 0, 0)"),
            ],
        };
        let findings = scorer().score(&raw).unwrap();

        assert_eq!(
            ids(&findings),
            vec![
                "images-missing-alt",
                "multiple-h1",
                "heading-level-skipped",
                "color-contrast",
            ]
        );
        assert_eq!(raw.skipped_levels(), 2);
        assert_eq!(
            findings[3].metric("elements"),
            Some(&sitediag_core::MetricValue::Int(1))
        );
    }

    #[tokio::test]
    async fn test_collect_from_document() {
        let el = |tag: &str, role: Option<&str>| Element {
            tag: tag.into(),
            role: role.map(String::from),
            ..Default::default()
        };
        let mut banner = el("div", Some("banner"));
        banner.color = Some("red".into());
        banner.background_color = Some("red".into());

        let doc = Document {
            images: vec![
                Image {
                    src: "a.png".into(),
                    alt: Some(" ".into()),
                },
                Image {
                    src: "b.png".into(),
                    alt: Some("chart".into()),
                },
            ],
            elements: vec![el("h1", None), banner, el("h2", None), el("nav", Some("navigation"))],
            ..Default::default()
        };
        let ctx = FakeContext::new("https://example.com/").with_document(doc);

        let raw = AccessibilityCollector.collect(&ctx).await.unwrap().data;
        assert_eq!(raw.images, 2);
        assert_eq!(raw.images_missing_alt, 1);
        assert_eq!(raw.heading_levels, vec![1, 2]);
        assert_eq!(raw.aria_roles, 2);
        assert_eq!(raw.colors.len(), 1);
        assert_eq!(raw.colors[0].tag, "div");
    }
}
