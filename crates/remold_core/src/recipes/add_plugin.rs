//! `add-plugin`: declares a plugin in a settings document.

use remold_tree::{Block, Declaration, Document, Node, NodeKind, Rewrite, Token, Visitor};
use semver::{Version, VersionReq};
use serde::Deserialize;
use tracing::debug;

use super::parse_options;
use crate::markers::{PluginRepositories, SourceRole};
use crate::precondition::{Precondition, has_role};
use crate::recipe::{Recipe, RecipeDescriptor, RecipeOption};
use crate::style::{Styles, TabsAndIndentsStyle};
use crate::{ExecutionContext, RecipeError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPluginOptions {
    pub plugin_id: String,
    pub version: String,
    #[serde(default)]
    pub version_pattern: Option<String>,
}

/// How the plugin version is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// Written as given.
    Exact(String),
    /// Highest published version matching the requirement.
    Range(VersionReq),
}

impl VersionSelector {
    /// Parses `1.2.0` and `1.0.0-rc1` as exact and `3.x`, `^1.2`, `>=1, <2`,
    /// `1.0 - 2.0`, `25-29` or `latest.release` as a range.
    pub fn parse(selector: &str) -> Result<Self, String> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err("version must not be empty".to_string());
        }
        if selector == "latest.release" {
            return Ok(Self::Range(VersionReq::STAR));
        }
        if let Some((low, high)) = selector.split_once(" - ") {
            let req = format!(">={}, <={}", low.trim(), high.trim());
            return VersionReq::parse(&req)
                .map(Self::Range)
                .map_err(|e| format!("invalid version range '{selector}': {e}"));
        }
        if let Some((low, high)) = selector.split_once('-')
            && is_numeric_version(low)
            && is_numeric_version(high)
        {
            let req = format!(">={low}, <={high}");
            return VersionReq::parse(&req)
                .map(Self::Range)
                .map_err(|e| format!("invalid version range '{selector}': {e}"));
        }
        let is_range = selector
            .chars()
            .any(|c| matches!(c, 'x' | 'X' | '*' | '^' | '~' | '>' | '<' | '=' | ','));
        if is_range {
            return VersionReq::parse(selector)
                .map(Self::Range)
                .map_err(|e| format!("invalid version selector '{selector}': {e}"));
        }
        Ok(Self::Exact(selector.to_string()))
    }

    /// Picks the version to write from the published `available` versions.
    ///
    /// With `version_pattern`, only versions ending in it are considered and
    /// the suffix is ignored while matching (`29.0-jre` matches `29.x`).
    pub fn resolve(&self, available: &[String], version_pattern: Option<&str>) -> Option<String> {
        let req = match self {
            Self::Exact(version) => return Some(version.clone()),
            Self::Range(req) => req,
        };

        available
            .iter()
            .filter_map(|candidate| {
                let base = match version_pattern {
                    Some(pattern) => candidate.strip_suffix(pattern)?,
                    None => candidate.as_str(),
                };
                let parsed = lenient_version(base)?;
                req.matches(&parsed).then_some((parsed, candidate))
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, candidate)| candidate.clone())
    }
}

/// `25`, `29.0` or `1.2.3`: up to three dot-separated numbers.
fn is_numeric_version(text: &str) -> bool {
    let parts: Vec<&str> = text.split('.').collect();
    parts.len() <= 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// Parses versions with fewer than three numeric components (`29.0`, `3`).
fn lenient_version(text: &str) -> Option<Version> {
    let split = text.find(['-', '+']).unwrap_or(text.len());
    let (core, rest) = text.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty()
        || parts.len() > 3
        || parts
            .iter()
            .any(|part| part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    Version::parse(&format!("{padded}{rest}")).ok()
}

/// Adds `id: <plugin_id> version <version>` to the `plugins` block of
/// settings documents, creating the block when missing.
///
/// Requires a [`PluginRepositories`] marker on the document; without one
/// the document is left unchanged. A plugin that is already declared is
/// never touched, whatever its version.
#[derive(Debug, Clone)]
pub struct AddPlugin {
    options: AddPluginOptions,
    selector: VersionSelector,
}

impl AddPlugin {
    pub const NAME: &'static str = "add-plugin";

    pub fn new(plugin_id: impl Into<String>, version: impl Into<String>) -> Result<Self, RecipeError> {
        Self::from_typed(AddPluginOptions {
            plugin_id: plugin_id.into(),
            version: version.into(),
            version_pattern: None,
        })
    }

    pub fn with_version_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.options.version_pattern = Some(pattern.into());
        self
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self, RecipeError> {
        Self::from_typed(parse_options(Self::NAME, options)?)
    }

    fn from_typed(options: AddPluginOptions) -> Result<Self, RecipeError> {
        let plugin_id = options.plugin_id.trim();
        if plugin_id.is_empty() || plugin_id.contains(char::is_whitespace) {
            return Err(RecipeError::invalid_options(
                Self::NAME,
                "`plugin_id` must be a single non-empty word",
            ));
        }
        let selector = VersionSelector::parse(&options.version)
            .map_err(|message| RecipeError::invalid_options(Self::NAME, message))?;
        Ok(Self { options, selector })
    }

    pub fn descriptor() -> RecipeDescriptor {
        RecipeDescriptor {
            name: Self::NAME,
            display_name: "Add settings plugin",
            description: "Adds a plugin to the `plugins` block of settings documents.",
            options: Self::option_list(),
        }
    }

    fn option_list() -> Vec<RecipeOption> {
        vec![
            RecipeOption::required("plugin_id", "Plugin id", "The plugin id to apply.")
                .with_example("com.gradle.enterprise"),
            RecipeOption::required(
                "version",
                "Plugin version",
                "An exact version number or a selector such as `3.x`.",
            )
            .with_example("3.x"),
            RecipeOption::optional(
                "version_pattern",
                "Version pattern",
                "Suffix a published version must end with, e.g. `-jre`.",
            )
            .with_example("-jre"),
        ]
    }
}

impl Recipe for AddPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Add settings plugin"
    }

    fn description(&self) -> &str {
        "Adds a plugin to the `plugins` block of settings documents."
    }

    fn options(&self) -> Vec<RecipeOption> {
        Self::option_list()
    }

    fn precondition(&self) -> Option<Box<dyn Precondition>> {
        Some(Box::new(has_role(SourceRole::Settings)))
    }

    fn visitor(&self) -> Box<dyn Visitor<ExecutionContext> + '_> {
        Box::new(AddPluginVisitor { recipe: self })
    }
}

struct AddPluginVisitor<'a> {
    recipe: &'a AddPlugin,
}

impl Visitor<ExecutionContext> for AddPluginVisitor<'_> {
    fn visit_document(&mut self, document: &Document, ctx: &mut ExecutionContext) -> Rewrite<Document> {
        let plugin_id = self.recipe.options.plugin_id.trim();
        let Some(repositories) = document.markers().find_first::<PluginRepositories>() else {
            debug!(plugin_id, "no plugin repositories on document");
            return Rewrite::Unchanged;
        };
        let Some(version) = self.recipe.selector.resolve(
            repositories.versions_of(plugin_id),
            self.recipe.options.version_pattern.as_deref(),
        ) else {
            ctx.warn(format!(
                "no published version of {} matches '{}'",
                plugin_id, self.recipe.options.version
            ));
            return Rewrite::Unchanged;
        };
        let Some(root) = document.root().as_block() else {
            ctx.fail(RecipeError::stage(AddPlugin::NAME, "document root is not a block"));
            return Rewrite::Unchanged;
        };

        let items = &root.children;
        let plugins_index = items.iter().position(is_plugins_block);
        if plugins_index.is_some_and(|index| declares_plugin(&items[index], plugin_id)) {
            return Rewrite::Unchanged;
        }

        let fallback_indent = Styles::for_document(document)
            .get::<TabsAndIndentsStyle>()
            .indent(1);
        let mut children = items.clone();
        match plugins_index {
            Some(index) => {
                children[index] = append_entry(&items[index], plugin_id, &version, &fallback_indent);
            }
            None => {
                let management = items
                    .iter()
                    .position(|item| declaration_name(item) == Some("pluginManagement"));
                let (position, prefix) = match management {
                    Some(index) => (index + 1, "\n\n"),
                    None if items.is_empty() => (0, ""),
                    None => (items.len(), "\n\n"),
                };
                children.insert(
                    position,
                    plugins_block(plugin_id, &version, &fallback_indent).with_prefix(prefix),
                );
            }
        }

        ctx.increment("add-plugin.added");
        debug!(plugin_id, version = %version, "added plugin");
        let root = document.root().with_kind(NodeKind::Block(Block {
            open: root.open.clone(),
            children,
            close: root.close.clone(),
        }));
        Rewrite::Replaced(document.with_root(root))
    }
}

fn declaration_name(node: &Node) -> Option<&str> {
    node.as_declaration().and_then(|declaration| declaration.name.text())
}

fn is_plugins_block(node: &Node) -> bool {
    declaration_name(node) == Some("plugins")
        && node
            .as_declaration()
            .and_then(|declaration| declaration.value.as_block())
            .is_some_and(|block| block.open.is_some())
}

fn unquote(text: &str) -> &str {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    if quoted { &text[1..text.len() - 1] } else { text }
}

/// The plugin id declared by one entry of a `plugins` block, accepting both
/// `id: x ...` and `id x ...`.
fn declared_id(entry: &Node) -> Option<&str> {
    if let Some(declaration) = entry.as_declaration() {
        if declaration.name.text() != Some("id") {
            return None;
        }
        let value = &declaration.value;
        let first = match value.as_expression() {
            Some(expression) => expression.operands.first()?,
            None => value,
        };
        return first.text().map(unquote);
    }
    let operands = &entry.as_expression()?.operands;
    if operands.first()?.text() != Some("id") {
        return None;
    }
    operands.get(1)?.text().map(unquote)
}

fn declares_plugin(plugins: &Node, plugin_id: &str) -> bool {
    plugins
        .as_declaration()
        .and_then(|declaration| declaration.value.as_block())
        .is_some_and(|block| {
            block
                .children
                .iter()
                .any(|entry| declared_id(entry) == Some(plugin_id))
        })
}

fn plugin_entry(plugin_id: &str, version: &str, indent: &str) -> Node {
    Node::declaration(
        Node::literal("id"),
        Some(Token::bare(":")),
        Node::expression(vec![
            Node::literal(plugin_id),
            Node::literal("version").with_prefix(" "),
            Node::literal(version).with_prefix(" "),
        ])
        .with_prefix(" "),
    )
    .with_prefix(format!("\n{indent}"))
}

fn plugins_block(plugin_id: &str, version: &str, indent: &str) -> Node {
    Node::declaration(
        Node::literal("plugins"),
        None,
        Node::block(
            Some(Token::bare("{")),
            vec![plugin_entry(plugin_id, version, indent)],
            Some(Token::new("\n", "}")),
        )
        .with_prefix(" "),
    )
}

/// Indentation of a line-leading prefix.
fn line_indent(prefix: &str) -> Option<&str> {
    prefix.rfind('\n').map(|index| &prefix[index + 1..])
}

fn append_entry(plugins: &Node, plugin_id: &str, version: &str, fallback_indent: &str) -> Node {
    let Some(declaration) = plugins.as_declaration() else {
        return plugins.clone();
    };
    let Some(block) = declaration.value.as_block() else {
        return plugins.clone();
    };

    let indent = block
        .children
        .iter()
        .find_map(|child| line_indent(child.prefix()))
        .unwrap_or(fallback_indent);
    let mut children = block.children.clone();
    children.push(plugin_entry(plugin_id, version, indent));
    let close = block.close.as_ref().map(|close| {
        if close.prefix.contains('\n') {
            close.clone()
        } else {
            Token::new("\n", close.text.clone())
        }
    });

    let value = declaration.value.with_kind(NodeKind::Block(Block {
        open: block.open.clone(),
        children,
        close,
    }));
    plugins.with_kind(NodeKind::Declaration(Declaration {
        name: declaration.name.clone(),
        delimiter: declaration.delimiter.clone(),
        value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use remold_parser::{Parser, SettingsParser};
    use rstest::rstest;

    use crate::pipeline::{Pipeline, apply_recipe};

    fn settings(source: &str) -> Document {
        SettingsParser::new()
            .parse(source)
            .unwrap()
            .with_marker(SourceRole::Settings)
            .with_marker(
                PluginRepositories::new(["gradlePluginPortal"])
                    .with_versions("com.example.tool", ["1.0.0", "1.2.0", "2.0.0"])
                    .with_versions("com.google.guava", ["29.0-jre", "29.0-android", "30.1-jre"]),
            )
    }

    fn run(recipe: &AddPlugin, document: &Document) -> (String, ExecutionContext) {
        let mut ctx = ExecutionContext::new();
        let result = apply_recipe(recipe, document, &mut ctx).unwrap_or(document.clone());
        (result.to_string(), ctx)
    }

    #[rstest]
    #[case::exact("1.2.0", None, Some("1.2.0"))]
    #[case::exact_unpublished("9.9.9", None, Some("9.9.9"))]
    #[case::wildcard("1.x", None, Some("1.2.0"))]
    #[case::caret("^1.0", None, Some("1.2.0"))]
    #[case::latest("latest.release", None, Some("2.0.0"))]
    #[case::hyphen_range("1.0.0 - 1.1.0", None, Some("1.0.0"))]
    #[case::compact_range("1-1.1", None, Some("1.0.0"))]
    #[case::no_match("3.x", None, None)]
    fn test_version_resolution(
        #[case] selector: &str,
        #[case] pattern: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let available: Vec<String> = ["1.0.0", "1.2.0", "2.0.0"].map(String::from).to_vec();
        let selector = VersionSelector::parse(selector).unwrap();
        assert_eq!(selector.resolve(&available, pattern).as_deref(), expected);
    }

    #[rstest]
    #[case::jre("29.x", Some("-jre"), Some("29.0-jre"))]
    #[case::android("29.x", Some("-android"), Some("29.0-android"))]
    #[case::newest_jre("latest.release", Some("-jre"), Some("30.1-jre"))]
    #[case::no_pattern_skips_prerelease_like("29.x", None, None)]
    #[case::compact_range("25-29", Some("-jre"), Some("29.0-jre"))]
    #[case::compact_range_android("25-29", Some("-android"), Some("29.0-android"))]
    #[case::prerelease_is_exact("1.0.0-rc1", None, Some("1.0.0-rc1"))]
    fn test_version_pattern(
        #[case] selector: &str,
        #[case] pattern: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let available: Vec<String> = ["29.0-jre", "29.0-android", "30.1-jre"].map(String::from).to_vec();
        let selector = VersionSelector::parse(selector).unwrap();
        assert_eq!(selector.resolve(&available, pattern).as_deref(), expected);
    }

    #[rstest]
    #[case::one("3", Some("3.0.0"))]
    #[case::two("29.0", Some("29.0.0"))]
    #[case::three("1.2.3", Some("1.2.3"))]
    #[case::suffix("29.0-jre", Some("29.0.0-jre"))]
    #[case::word("final", None)]
    #[case::too_many("1.2.3.4", None)]
    fn test_lenient_version(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(lenient_version(input).map(|v| v.to_string()).as_deref(), expected);
    }

    #[test]
    fn test_appends_to_existing_block() {
        let document = settings(
            "rootProject: demo\nplugins {\n    id: com.example.other version 0.1\n}\n",
        );
        let recipe = AddPlugin::new("com.example.tool", "1.x").unwrap();
        let (output, ctx) = run(&recipe, &document);

        assert_eq!(
            output,
            "rootProject: demo\nplugins {\n    id: com.example.other version 0.1\n    id: com.example.tool version 1.2.0\n}\n"
        );
        assert_eq!(ctx.counter("add-plugin.added"), 1);
    }

    #[test]
    fn test_creates_block_after_plugin_management() {
        let document = settings(
            "pluginManagement {\n  repositories {\n    gradlePluginPortal\n  }\n}\nrootProject: demo\n",
        );
        let recipe = AddPlugin::new("com.example.tool", "2.0.0").unwrap();
        let (output, _) = run(&recipe, &document);

        assert_eq!(
            output,
            "pluginManagement {\n  repositories {\n    gradlePluginPortal\n  }\n}\n\nplugins {\n    id: com.example.tool version 2.0.0\n}\nrootProject: demo\n"
        );
    }

    #[test]
    fn test_creates_block_at_end_with_tab_style() {
        let document = settings("rootProject: demo\n").with_marker(TabsAndIndentsStyle {
            use_tab_character: true,
            indent_size: 4,
        });
        let recipe = AddPlugin::new("com.example.tool", "1.0.0").unwrap();
        let (output, _) = run(&recipe, &document);

        assert_eq!(
            output,
            "rootProject: demo\n\nplugins {\n\tid: com.example.tool version 1.0.0\n}\n"
        );
    }

    #[test]
    fn test_inline_empty_block_gets_closing_newline() {
        let document = settings("plugins {}\n");
        let recipe = AddPlugin::new("com.example.tool", "1.0.0").unwrap();
        let (output, _) = run(&recipe, &document);

        assert_eq!(output, "plugins {\n    id: com.example.tool version 1.0.0\n}\n");
    }

    #[rstest]
    #[case::declaration("plugins {\n  id: com.example.tool version 1.0.0\n}\n")]
    #[case::statement("plugins {\n  id 'com.example.tool' version '1.0.0'\n}\n")]
    fn test_already_declared_is_unchanged(#[case] source: &str) {
        let recipe = AddPlugin::new("com.example.tool", "2.0.0").unwrap();
        let mut ctx = ExecutionContext::new();
        assert!(!apply_recipe(&recipe, &settings(source), &mut ctx).is_changed());
    }

    #[test]
    fn test_requires_settings_role() {
        let document = settings("rootProject: demo\n").with_marker(SourceRole::Build);
        let recipe = AddPlugin::new("com.example.tool", "1.0.0").unwrap();
        let mut ctx = ExecutionContext::new();
        assert!(!apply_recipe(&recipe, &document, &mut ctx).is_changed());
        assert_eq!(ctx.counter("add-plugin.added"), 0);
    }

    #[test]
    fn test_requires_plugin_repositories() {
        let document = SettingsParser::new()
            .parse("rootProject: demo\n")
            .unwrap()
            .with_marker(SourceRole::Settings);
        let recipe = AddPlugin::new("com.example.tool", "1.0.0").unwrap();
        let mut ctx = ExecutionContext::new();
        assert!(!apply_recipe(&recipe, &document, &mut ctx).is_changed());
    }

    #[test]
    fn test_unresolvable_version_warns() {
        let recipe = AddPlugin::new("com.example.tool", "5.x").unwrap();
        let (output, ctx) = run(&recipe, &settings("rootProject: demo\n"));

        assert_eq!(output, "rootProject: demo\n");
        assert_eq!(ctx.messages().len(), 1);
        assert_eq!(
            ctx.messages()[0].text,
            "no published version of com.example.tool matches '5.x'"
        );
    }

    #[test]
    fn test_pipeline_idempotence() {
        let pipeline = Pipeline::new().with_recipe(
            AddPlugin::new("com.google.guava", "29.x")
                .unwrap()
                .with_version_pattern("-jre"),
        );
        let document = settings("rootProject: demo\n");
        let first = pipeline.run(&document, &mut ExecutionContext::new());
        let second = pipeline.run(&first.document, &mut ExecutionContext::new());

        assert!(first.changed);
        assert_eq!(
            first.document.to_string(),
            "rootProject: demo\n\nplugins {\n    id: com.google.guava version 29.0-jre\n}\n"
        );
        assert!(!second.changed);
    }

    #[test]
    fn test_compact_range_with_version_pattern() {
        let recipe = AddPlugin::from_options(&serde_json::json!({
            "plugin_id": "com.google.guava",
            "version": "25-29",
            "version_pattern": "-jre",
        }))
        .unwrap();
        let (output, _) = run(&recipe, &settings("rootProject: demo\n"));

        assert_eq!(
            output,
            "rootProject: demo\n\nplugins {\n    id: com.google.guava version 29.0-jre\n}\n"
        );
    }

    #[rstest]
    #[case::empty_id(serde_json::json!({ "plugin_id": "", "version": "1.0" }))]
    #[case::bad_range(serde_json::json!({ "plugin_id": "a", "version": ">=banana" }))]
    #[case::missing_version(serde_json::json!({ "plugin_id": "a" }))]
    fn test_invalid_options(#[case] options: serde_json::Value) {
        assert!(matches!(
            AddPlugin::from_options(&options),
            Err(RecipeError::InvalidOptions { .. })
        ));
    }
}
