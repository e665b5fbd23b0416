//! Read-only page model.
//!
//! A [`Document`] is the subset of DOM facts the diagnostic modules query:
//! head metadata, links, scripts, stylesheets and a flat element list with
//! the two computed colors the contrast heuristic compares. Every field
//! defaults so snapshots can omit what their source cannot see.

use serde::{Deserialize, Serialize};

/// A `<meta>` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaTag {
    pub name: Option<String>,
    pub property: Option<String>,
    pub content: String,
}

/// A `<link>` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkTag {
    /// Space separated rel tokens, as written.
    pub rel: String,
    pub href: Option<String>,
    pub integrity: Option<String>,
    pub crossorigin: Option<String>,
    pub media: Option<String>,
}

impl LinkTag {
    pub fn has_rel(&self, token: &str) -> bool {
        self.rel
            .split_ascii_whitespace()
            .any(|t| t.eq_ignore_ascii_case(token))
    }
}

/// An `<a href>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anchor {
    pub href: String,
    pub rel: String,
    pub text: String,
}

impl Anchor {
    pub fn is_nofollow(&self) -> bool {
        self.rel.contains("nofollow")
    }
}

/// An `<img>` element. `alt` is `None` when the attribute is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub src: String,
    pub alt: Option<String>,
}

impl Image {
    /// Missing or whitespace-only alt text.
    pub fn lacks_alt(&self) -> bool {
        self.alt.as_deref().map(str::trim).unwrap_or("").is_empty()
    }
}

/// A `<script>` element, external (`src`) or inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Script {
    pub src: Option<String>,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub defer: bool,
    #[serde(rename = "type")]
    pub script_type: Option<String>,
    pub integrity: Option<String>,
    pub crossorigin: Option<String>,
    /// Length of the inline body; zero for external scripts.
    pub text_length: u64,
}

impl Script {
    pub fn is_external(&self) -> bool {
        self.src.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// External, neither async nor deferred.
    pub fn is_render_blocking(&self) -> bool {
        self.is_external() && !self.is_async && !self.defer
    }
}

/// An inline `<style>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InlineStyle {
    pub media: Option<String>,
    pub text_length: u64,
}

/// An entry of `document.styleSheets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSheet {
    /// `None` for `<style>` blocks.
    pub href: Option<String>,
    /// Selector texts of the sheet's style rules. `None` when the rules could
    /// not be read (cross-origin sheet without CORS).
    pub rules: Option<Vec<String>>,
}

/// One element of the flattened DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Element {
    /// Lower-case tag name.
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub role: Option<String>,
    /// Computed `color`.
    pub color: Option<String>,
    /// Computed `background-color`.
    pub background_color: Option<String>,
}

impl Element {
    /// Heading level for `h1`..`h6`.
    pub fn heading_level(&self) -> Option<u8> {
        let rest = self.tag.strip_prefix('h')?;
        match rest.parse::<u8>() {
            Ok(level @ 1..=6) => Some(level),
            _ => None,
        }
    }
}

/// Page snapshot as seen by the diagnostic modules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    pub title: Option<String>,
    pub meta: Vec<MetaTag>,
    pub links: Vec<LinkTag>,
    pub anchors: Vec<Anchor>,
    pub images: Vec<Image>,
    pub scripts: Vec<Script>,
    pub inline_styles: Vec<InlineStyle>,
    pub style_sheets: Vec<StyleSheet>,
    pub elements: Vec<Element>,
}

impl Document {
    /// Non-empty `<title>` text.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Content of `<meta name="...">`.
    pub fn meta_named(&self, name: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|m| m.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .map(|m| m.content.as_str())
    }

    /// Content of `<meta property="...">`.
    pub fn meta_property(&self, property: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|m| {
                m.property
                    .as_deref()
                    .is_some_and(|p| p.eq_ignore_ascii_case(property))
            })
            .map(|m| m.content.as_str())
    }

    /// First `<link>` carrying the given rel token.
    pub fn link_with_rel(&self, rel: &str) -> Option<&LinkTag> {
        self.links.iter().find(|l| l.has_rel(rel))
    }

    /// `<link rel="stylesheet" href>` tags.
    pub fn stylesheet_links(&self) -> impl Iterator<Item = &LinkTag> {
        self.links
            .iter()
            .filter(|l| l.has_rel("stylesheet") && l.href.is_some())
    }

    pub fn external_scripts(&self) -> impl Iterator<Item = &Script> {
        self.scripts.iter().filter(|s| s.is_external())
    }

    pub fn inline_scripts(&self) -> impl Iterator<Item = &Script> {
        self.scripts.iter().filter(|s| !s.is_external())
    }

    /// `h1`..`h6` elements in document order.
    pub fn headings(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.heading_level().is_some())
    }

    /// Elements carrying an explicit `role` attribute.
    pub fn elements_with_role(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.role.is_some())
    }
}
