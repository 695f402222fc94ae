//! End-to-end pipeline behavior over parsed settings documents.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use remold_core::markers::{SearchResult, SourceRole};
use remold_core::precondition::has_role;
use remold_core::recipes::{AddPlugin, AutoFormat, ChangeValue, FindText};
use remold_core::{
    ExecutionContext, Pipeline, Precondition, Recipe, RecipeConfig, RecipeRegistry, run_documents,
};
use remold_parser::{Parser, SettingsParser};
use remold_tree::{Cursor, Document, Node, Rewrite, Visitor, print_document};

fn parse(source: &str) -> Document {
    SettingsParser::new().parse(source).unwrap()
}

/// Counts visited nodes, scoped to settings documents.
struct CountSettingsNodes;

struct CountVisitor;

impl Visitor<ExecutionContext> for CountVisitor {
    fn visit_node(
        &mut self,
        node: &Node,
        ctx: &mut ExecutionContext,
        cursor: &mut Cursor,
    ) -> Rewrite<Node> {
        ctx.increment("visited");
        remold_tree::visitor::walk_node(self, node, ctx, cursor)
    }
}

impl Recipe for CountSettingsNodes {
    fn name(&self) -> &str {
        "count-settings-nodes"
    }
    fn display_name(&self) -> &str {
        "Count settings nodes"
    }
    fn description(&self) -> &str {
        "Counts nodes of settings documents."
    }
    fn precondition(&self) -> Option<Box<dyn Precondition>> {
        Some(Box::new(has_role(SourceRole::Settings)))
    }
    fn visitor(&self) -> Box<dyn Visitor<ExecutionContext> + '_> {
        Box::new(CountVisitor)
    }
}

#[test]
fn guard_short_circuits_traversal() {
    let pipeline = Pipeline::new().with_recipe(CountSettingsNodes);
    let document = parse("a: b\nblock {\n    c: d\n}\n").with_marker(SourceRole::Build);

    let mut ctx = ExecutionContext::new();
    let outcome = pipeline.run(&document, &mut ctx);

    assert!(outcome.is_ok());
    assert!(!outcome.changed);
    assert_eq!(ctx.counter("visited"), 0);

    let mut ctx = ExecutionContext::new();
    pipeline.run(&document.with_marker(SourceRole::Settings), &mut ctx);
    assert!(ctx.counter("visited") > 0);
}

#[test]
fn value_change_keeps_surrounding_text() {
    let pipeline = Pipeline::new().with_recipe(ChangeValue::new("a", "c").unwrap());
    let document = parse("a:  b\n");
    assert_eq!(print_document(&document), "a:  b\n");

    let outcome = pipeline.run(&document, &mut ExecutionContext::new());
    assert_eq!(print_document(&outcome.document), "a:  c\n");
}

#[test]
fn marker_only_stage_keeps_printed_output() {
    let source = "a: b\nsub {\n    a: b\n}\n";
    let pipeline = Pipeline::new()
        .with_recipe(ChangeValue::new("a", "TODO").unwrap())
        .with_recipe(FindText::new("TODO").unwrap());

    let mut ctx = ExecutionContext::new();
    let outcome = pipeline.run(&parse(source), &mut ctx);

    assert!(outcome.converged);
    assert_eq!(
        print_document(&outcome.document),
        "a: TODO\nsub {\n    a: TODO\n}\n"
    );

    let mut counters: Vec<_> = ctx.counters().iter().map(|(k, v)| (k.clone(), *v)).collect();
    counters.sort();
    insta::assert_debug_snapshot!(counters, @r#"
    [
        (
            "change-value.changed",
            2,
        ),
        (
            "find-text.matches",
            2,
        ),
    ]
    "#);
}

#[test]
fn search_results_append_and_roles_replace() {
    let node = Node::literal("x")
        .with_marker(SearchResult::new("x"))
        .with_marker(SearchResult::new("y"));
    assert_eq!(node.markers().find_all::<SearchResult>().count(), 2);

    let document = parse("x\n")
        .with_marker(SourceRole::Build)
        .with_marker(SourceRole::Settings);
    assert_eq!(document.markers().find_all::<SourceRole>().count(), 1);
    assert_eq!(
        document.markers().find_first::<SourceRole>(),
        Some(&SourceRole::Settings)
    );
}

#[test]
fn configured_pipeline_runs_in_parallel() {
    let registry = RecipeRegistry::with_builtins();
    let recipes = vec![
        RecipeConfig::Name("auto-format".into()),
        RecipeConfig::Detail {
            name: "change-value".into(),
            options: serde_json::json!({ "key": "name", "new_value": "demo" }),
        },
    ];
    let pipeline = registry.build_pipeline(&recipes, 3).unwrap();

    let documents: Vec<_> = (0..16)
        .map(|i| parse(&format!("name: app{i}\nblock {{\n  key :  {i}\n}}\n")))
        .collect();
    let batch = run_documents(&pipeline, &documents, false);

    assert_eq!(batch.failures().count(), 0);
    for (i, report) in batch.documents.iter().enumerate() {
        assert_eq!(
            report.output.as_deref(),
            Some(format!("name: demo\nblock {{\n    key: {i}\n}}\n").as_str())
        );
    }
}

#[test]
fn add_plugin_needs_settings_role_and_repositories() {
    use remold_core::markers::PluginRepositories;

    let recipe = AddPlugin::new("org.example.tool", "1.x").unwrap();
    let pipeline = Pipeline::new().with_recipe(recipe);
    let repositories = PluginRepositories::new(["gradlePluginPortal"])
        .with_versions("org.example.tool", ["1.0.0", "1.4.2", "2.0.0"]);
    let source = "rootProject: demo\n";

    let build = parse(source)
        .with_marker(SourceRole::Build)
        .with_marker(repositories.clone());
    let outcome = pipeline.run(&build, &mut ExecutionContext::new());
    assert!(!outcome.changed);

    let settings = parse(source)
        .with_marker(SourceRole::Settings)
        .with_marker(repositories);
    let outcome = pipeline.run(&settings, &mut ExecutionContext::new());
    assert_eq!(
        print_document(&outcome.document),
        "rootProject: demo\n\nplugins {\n    id: org.example.tool version 1.4.2\n}\n"
    );
}

fn settings_source() -> impl Strategy<Value = String> {
    let key = "[a-z]{1,5}";
    let value = "[a-z0-9.]{1,5}";
    let line = prop_oneof![
        (key, "[ \t]{0,2}", "[ \t]{0,3}", value)
            .prop_map(|(k, before, after, v)| format!("{k}{before}:{after}{v}\n")),
        (key, "[ \t]{0,3}", key, value)
            .prop_map(|(name, indent, k, v)| format!("{name} {{\n{indent}{k}: {v}\n}}\n")),
        Just("\n".to_string()),
        Just("# note\n".to_string()),
    ];
    prop::collection::vec(line, 0..8).prop_map(|lines| lines.concat())
}

proptest! {
    #[test]
    fn pipeline_is_idempotent(source in settings_source()) {
        let pipeline = Pipeline::new()
            .with_recipe(AutoFormat::new())
            .with_recipe(ChangeValue::new("a", "z").unwrap());

        let first = pipeline.run(&parse(&source), &mut ExecutionContext::new());
        prop_assert!(first.is_ok());

        let printed = print_document(&first.document);
        let second = pipeline.run(&parse(&printed), &mut ExecutionContext::new());
        prop_assert!(second.is_ok());
        prop_assert!(!second.changed);
        prop_assert_eq!(print_document(&second.document), printed);
    }

    #[test]
    fn untouched_documents_round_trip(source in settings_source()) {
        let pipeline = Pipeline::new().with_recipe(FindText::new("\u{1F600}").unwrap());
        let document = parse(&source);
        let outcome = pipeline.run(&document, &mut ExecutionContext::new());
        prop_assert!(!outcome.changed);
        prop_assert_eq!(print_document(&outcome.document), source);
    }
}
