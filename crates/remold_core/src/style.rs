//! Formatting styles carried as document markers.
//!
//! A style is an ordinary [`Marker`] with a documented default. Recipes
//! never read style markers directly; they resolve them through
//! [`resolve_style`] or a per-pass [`Styles`] cache so that a missing marker
//! falls back to the default.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use remold_tree::{Document, Marker};
use serde::{Deserialize, Serialize};

/// A formatting style domain.
pub trait Style: Marker + Default + Clone {}

/// Blank line limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlankLinesStyle {
    /// Maximum number of consecutive blank lines kept. Default `2`.
    pub keep_maximum: usize,
}

impl Default for BlankLinesStyle {
    fn default() -> Self {
        Self { keep_maximum: 2 }
    }
}

impl Marker for BlankLinesStyle {}
impl Style for BlankLinesStyle {}

/// Indentation of line-leading nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabsAndIndentsStyle {
    /// Indent with one tab per level instead of spaces. Default `false`.
    pub use_tab_character: bool,
    /// Spaces per indentation level. Default `4`.
    pub indent_size: usize,
}

impl TabsAndIndentsStyle {
    /// Indentation text for `depth` levels.
    pub fn indent(&self, depth: usize) -> String {
        if self.use_tab_character {
            "\t".repeat(depth)
        } else {
            " ".repeat(self.indent_size * depth)
        }
    }
}

impl Default for TabsAndIndentsStyle {
    fn default() -> Self {
        Self {
            use_tab_character: false,
            indent_size: 4,
        }
    }
}

impl Marker for TabsAndIndentsStyle {}
impl Style for TabsAndIndentsStyle {}

/// Spacing around the `:` delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacesStyle {
    /// Space before `:`. Default `false`.
    pub before_colon: bool,
    /// Space after `:`. Default `true`.
    pub after_colon: bool,
}

impl Default for SpacesStyle {
    fn default() -> Self {
        Self {
            before_colon: false,
            after_colon: true,
        }
    }
}

impl Marker for SpacesStyle {}
impl Style for SpacesStyle {}

/// Returns the document's `S` marker, or `S::default()` when it has none.
pub fn resolve_style<S: Style>(document: &Document) -> S {
    document
        .markers()
        .find_first::<S>()
        .cloned()
        .unwrap_or_default()
}

/// Resolves each style domain at most once against a document snapshot.
///
/// Create one per document per pass; later edits to the document do not
/// affect styles already resolved.
#[derive(Debug)]
pub struct Styles {
    snapshot: Document,
    resolved: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Styles {
    pub fn for_document(document: &Document) -> Self {
        Self {
            snapshot: document.clone(),
            resolved: HashMap::new(),
        }
    }

    /// Returns the style for domain `S`, resolving it on first use.
    pub fn get<S: Style>(&mut self) -> S {
        let key = TypeId::of::<S>();
        if let Some(style) = self
            .resolved
            .get(&key)
            .and_then(|style| style.downcast_ref::<S>())
        {
            return style.clone();
        }
        let style = resolve_style::<S>(&self.snapshot);
        self.resolved.insert(key, Box::new(style.clone()));
        style
    }

    /// Number of domains resolved so far.
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}

/// Document-level style markers configured for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blank_lines: Option<BlankLinesStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs_and_indents: Option<TabsAndIndentsStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spaces: Option<SpacesStyle>,
}

impl StylesConfig {
    /// Attaches every configured style the document does not already carry.
    pub fn apply(&self, document: Document) -> Document {
        let document = attach_missing(document, self.blank_lines.as_ref());
        let document = attach_missing(document, self.tabs_and_indents.as_ref());
        attach_missing(document, self.spaces.as_ref())
    }
}

fn attach_missing<S: Style>(document: Document, style: Option<&S>) -> Document {
    match style {
        Some(style) if !document.markers().contains::<S>() => document.with_marker(style.clone()),
        _ => document,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use remold_tree::Node;

    fn empty_document() -> Document {
        Document::new(Node::block(None, vec![], None), "")
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let doc = empty_document();
        assert_eq!(resolve_style::<BlankLinesStyle>(&doc).keep_maximum, 2);
        assert_eq!(resolve_style::<TabsAndIndentsStyle>(&doc).indent(2), "        ");
        assert!(resolve_style::<SpacesStyle>(&doc).after_colon);
    }

    #[test]
    fn test_resolve_uses_document_marker() {
        let doc = empty_document().with_marker(TabsAndIndentsStyle {
            use_tab_character: true,
            indent_size: 2,
        });
        assert_eq!(resolve_style::<TabsAndIndentsStyle>(&doc).indent(2), "\t\t");
    }

    #[test]
    fn test_styles_resolve_against_snapshot() {
        let doc = empty_document().with_marker(BlankLinesStyle { keep_maximum: 0 });
        let mut styles = Styles::for_document(&doc);
        assert_eq!(styles.get::<BlankLinesStyle>().keep_maximum, 0);
        assert_eq!(styles.get::<BlankLinesStyle>().keep_maximum, 0);
        assert_eq!(styles.resolved_count(), 1);
        styles.get::<SpacesStyle>();
        assert_eq!(styles.resolved_count(), 2);
    }

    #[test]
    fn test_styles_config_does_not_override_existing_marker() {
        let config: StylesConfig = serde_json::from_value(serde_json::json!({
            "blank_lines": { "keep_maximum": 1 },
            "spaces": { "before_colon": true }
        }))
        .unwrap();
        let doc = empty_document().with_marker(BlankLinesStyle { keep_maximum: 5 });
        let doc = config.apply(doc);

        assert_eq!(resolve_style::<BlankLinesStyle>(&doc).keep_maximum, 5);
        let spaces = resolve_style::<SpacesStyle>(&doc);
        assert!(spaces.before_colon);
        assert!(spaces.after_colon);
        assert!(!doc.markers().contains::<TabsAndIndentsStyle>());
    }
}
