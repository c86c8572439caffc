use std::rc::Rc;

use thingy_core::{ResolvedTool, ToolAction, ToolDefinition, ToolFilter, ToolMatch, ToolTable};
use thingy_dom::{Document, NodeId, SelectorList};

fn find(doc: &Document, selector: &str) -> NodeId {
    doc.query_selector(doc.body(), &SelectorList::parse(selector).unwrap())
        .unwrap()
}

fn texts(tools: &[ResolvedTool]) -> Vec<String> {
    tools
        .iter()
        .map(|t| t.tool.caption().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn resolution_follows_table_order_with_region_fallback() {
    let doc = Document::from_body_html(r#"<p class="editable"><span>hi</span></p>"#).unwrap();
    let region = find(&doc, "p");
    let span = find(&doc, "span");

    let mut table = ToolTable::new();
    table
        .insert("span", vec![ToolDefinition::command("A", "bold")])
        .unwrap();
    table
        .insert("p", vec![ToolDefinition::command("B", "italic")])
        .unwrap();
    table
        .insert("div", vec![ToolDefinition::command("C", "underline")])
        .unwrap();

    let resolved = table.resolve(&doc, span, region, None);
    assert_eq!(texts(&resolved), vec!["A", "B"]);
    assert_eq!(resolved[0].controlled, span);
    assert_eq!(resolved[1].controlled, region);
}

#[test]
fn table_order_wins_over_active_before_region() {
    let mut doc = Document::new();
    let region = doc.create_element("p");
    doc.append_child(doc.body(), region);
    let active = doc.create_element("div");
    doc.append_child(region, active);

    let mut table = ToolTable::new();
    table
        .insert("p", vec![ToolDefinition::command("A", "bold")])
        .unwrap();
    table
        .insert("div", vec![ToolDefinition::command("B", "italic")])
        .unwrap();

    let resolved = table.resolve(&doc, active, region, None);
    assert_eq!(texts(&resolved), vec!["A", "B"]);
    assert_eq!(resolved[0].controlled, region);
    assert_eq!(resolved[1].controlled, active);
}

#[test]
fn duplicate_tools_across_selectors_are_kept() {
    let doc = Document::from_body_html("<div><p>x</p></div>").unwrap();
    let region = find(&doc, "div");
    let p = find(&doc, "p");

    let resolved = ToolTable::builtin().resolve(&doc, p, region, None);
    assert_eq!(texts(&resolved), vec!["B", "I", "U"]);

    let mut table = ToolTable::builtin();
    table
        .insert("p", vec![ToolDefinition::command("B", "bold")])
        .unwrap();
    let resolved = table.resolve(&doc, p, region, None);
    assert_eq!(texts(&resolved), vec!["B", "I", "U", "B"]);
}

#[test]
fn text_node_targets_resolve_through_their_parent() {
    let doc = Document::from_body_html(r#"<section><a href="/x">link</a></section>"#).unwrap();
    let region = find(&doc, "section");
    let a = find(&doc, "a");
    let text = doc.first_child(a).unwrap();

    let resolved = ToolTable::builtin().resolve(&doc, text, region, None);
    assert_eq!(texts(&resolved), vec!["Link href", "Link text", "\u{27a1}\u{fe0f}"]);
    assert!(resolved.iter().all(|t| t.controlled == a));
    assert!(matches!(
        resolved[2].tool.action,
        ToolAction::LinkPreview { .. }
    ));
}

#[test]
fn filter_overrides_selector_applicability() {
    let doc = Document::from_body_html("<div><p>x</p></div>").unwrap();
    let region = find(&doc, "div");
    let p = find(&doc, "p");

    let only_images: ToolFilter = Rc::new(|_: &Document, candidate: &ToolMatch<'_>| {
        candidate.selector.as_str() == "img"
    });
    let resolved = ToolTable::builtin().resolve(&doc, p, region, Some(&only_images));

    assert_eq!(texts(&resolved), vec!["Choose image"]);
    assert_eq!(resolved[0].controlled, p);
}

#[test]
fn tool_tables_serialize_in_declaration_order() {
    let table = ToolTable::builtin();
    let json = serde_json::to_string(&table).unwrap();
    let p = json.find(r#""p,div""#).unwrap();
    let a = json.find(r#""a":"#).unwrap();
    let img = json.find(r#""img""#).unwrap();
    assert!(p < a && a < img);

    let back: ToolTable = serde_json::from_str(&json).unwrap();
    assert_eq!(back, table);
}
