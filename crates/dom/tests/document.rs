use thingy_dom::{Document, EventKind, Rect, SelectionError, Selection, SelectorList};

fn sel(s: &str) -> SelectorList {
    SelectorList::parse(s).unwrap()
}

#[test]
fn parses_fragment_and_serializes_it_back() {
    let html = r#"<div class="card"><h3 title="a &quot;b&quot;">Fish &amp; chips</h3><img src="x.png"><br></div>"#;
    let doc = Document::from_body_html(html).unwrap();
    assert_eq!(doc.inner_html(doc.body()), html);
}

#[test]
fn quoted_angle_brackets_stay_inside_attributes() {
    let html = r#"<a title="a>b" href="/x">t</a>"#;
    let doc = Document::from_body_html(html).unwrap();
    let a = doc.query_selector(doc.body(), &sel("a")).unwrap();

    assert_eq!(doc.attribute(a, "title"), Some("a>b"));
    assert_eq!(doc.text_content(a), "t");
    assert_eq!(doc.inner_html(doc.body()), html);
}

#[test]
fn misnested_markup_is_repaired() {
    let doc = Document::from_body_html("<ul><li>one<li>two</ul><p>after</span></p>").unwrap();
    assert_eq!(
        doc.inner_html(doc.body()),
        "<ul><li>one</li><li>two</li></ul><p>after</p>"
    );
}

#[test]
fn truncated_tags_and_comments_are_dropped() {
    let doc = Document::from_body_html("<p>kept</p><!-- note --><div class='x'").unwrap();
    assert_eq!(doc.inner_html(doc.body()), "<p>kept</p>");
}

#[test]
fn entities_decode_into_text_and_attributes() {
    let doc = Document::from_body_html(r#"<a title="&lt;b&gt;">x &raquo; &#65;&#x42;</a>"#).unwrap();
    let a = doc.query_selector(doc.body(), &sel("a")).unwrap();
    assert_eq!(doc.attribute(a, "title"), Some("<b>"));
    assert_eq!(doc.text_content(a), "x \u{bb} AB");
}

#[test]
fn selector_matching_covers_combinators() {
    let doc = Document::from_body_html(
        r#"<ul class="list"><li><a href="/x"><h3 id="t">Title</h3></a><div><em>sub</em></div></li></ul>"#,
    )
    .unwrap();
    let body = doc.body();
    let h3 = doc.query_selector(body, &sel("h3")).unwrap();

    assert!(doc.matches(h3, &sel("a h3")));
    assert!(doc.matches(h3, &sel("a > h3")));
    assert!(doc.matches(h3, &sel(".list h3#t")));
    assert!(!doc.matches(h3, &sel("li > h3")));
    assert!(doc.matches(h3, &sel("p, h3")));

    let links = doc.query_selector_all(body, &sel("a[href='/x']"));
    assert_eq!(links.len(), 1);
    assert_eq!(doc.query_selector_all(body, &sel("div em")).len(), 1);
    assert_eq!(doc.query_selector_all(body, &sel("*")).len(), 6);
}

#[test]
fn structural_and_attribute_operators_match() {
    let doc = Document::from_body_html(
        r#"<ul><li><a href="/docs/a">A</a></li><li class="x"><a>B</a></li></ul>"#,
    )
    .unwrap();
    let body = doc.body();

    assert_eq!(doc.query_selector_all(body, &sel("li:first-child")).len(), 1);
    assert_eq!(doc.query_selector_all(body, &sel("li:not(.x) a")).len(), 1);
    assert_eq!(doc.query_selector_all(body, &sel(r#"a[href^="/docs"]"#)).len(), 1);
    assert_eq!(doc.query_selector_all(body, &sel("a:not([href])")).len(), 1);
    assert_eq!(doc.query_selector_all(body, &sel("li + li > a")).len(), 1);
}

#[test]
fn text_nodes_never_match_selectors() {
    let doc = Document::from_body_html("<p>hi</p>").unwrap();
    let p = doc.query_selector(doc.body(), &sel("p")).unwrap();
    let text = doc.first_child(p).unwrap();
    assert!(!doc.matches(text, &sel("*")));
}

#[test]
fn surround_selection_splits_single_text_node() {
    let mut doc = Document::from_body_html("<div class=\"card\"><h3>Hello World</h3></div>").unwrap();
    let h3 = doc.query_selector(doc.body(), &sel("h3")).unwrap();
    let text = doc.first_child(h3).unwrap();
    doc.set_selection(Some(Selection::within(text, 2, 6)));

    let strong = doc.surround_selection("strong", &[]).unwrap();

    assert_eq!(doc.inner_html(h3), "He<strong>llo </strong>World");
    assert_eq!(doc.children(h3).len(), 3);
    assert_eq!(doc.children(h3)[1], strong);

    let selection = doc.selection().copied().unwrap();
    assert_eq!(selection.anchor.offset, 0);
    assert_eq!(selection.focus.offset, 4);
    assert_eq!(doc.parent(selection.focus.node), Some(strong));
}

#[test]
fn surround_selection_handles_backwards_selection_and_attrs() {
    let mut doc = Document::from_body_html("<p>abcdef</p>").unwrap();
    let p = doc.query_selector(doc.body(), &sel("p")).unwrap();
    let text = doc.first_child(p).unwrap();
    doc.set_selection(Some(Selection::within(text, 6, 3)));

    let attrs = vec![("style".to_string(), "text-decoration: underline".to_string())];
    doc.surround_selection("span", &attrs).unwrap();

    assert_eq!(
        doc.inner_html(p),
        r#"abc<span style="text-decoration: underline">def</span>"#
    );
}

#[test]
fn surround_selection_rejects_multi_node_and_collapsed_selections() {
    let mut doc = Document::from_body_html("<p>ab<b>cd</b></p>").unwrap();
    let p = doc.query_selector(doc.body(), &sel("p")).unwrap();
    let first = doc.first_child(p).unwrap();
    let bold_text = doc.descendants(p)[2];

    doc.set_selection(Some(Selection::new(
        thingy_dom::Boundary::new(first, 1),
        thingy_dom::Boundary::new(bold_text, 1),
    )));
    assert_eq!(
        doc.surround_selection("em", &[]),
        Err(SelectionError::SpansMultipleNodes)
    );

    doc.set_selection(Some(Selection::within(first, 1, 1)));
    assert_eq!(doc.surround_selection("em", &[]), Err(SelectionError::Collapsed));

    doc.set_selection(None);
    assert_eq!(doc.surround_selection("em", &[]), Err(SelectionError::NoSelection));
    assert_eq!(doc.inner_html(p), "ab<b>cd</b>");
}

#[test]
fn exec_command_formats_selection() {
    let mut doc = Document::from_body_html("<p>make me bold</p>").unwrap();
    let p = doc.query_selector(doc.body(), &sel("p")).unwrap();
    let text = doc.first_child(p).unwrap();
    doc.set_selection(Some(Selection::within(text, 8, 12)));

    assert!(doc.exec_command("bold", None));
    assert_eq!(doc.inner_html(p), "make me <b>bold</b>");

    assert!(!doc.exec_command("justifyFull", None));
    assert!(!doc.exec_command("createLink", None));
}

#[test]
fn deep_clone_copies_attributes_text_and_geometry() {
    let mut doc = Document::from_body_html(r#"<li class="item"><a href="/a">A</a></li>"#).unwrap();
    let li = doc.query_selector(doc.body(), &sel("li")).unwrap();
    doc.set_rect(li, Rect::new(0., 0., 100., 20.));

    let copy = doc.clone_node(li, true);
    assert!(!doc.is_connected(copy));
    doc.insert_after(li, copy);

    assert_eq!(doc.next_sibling(li), Some(copy));
    assert_eq!(doc.outer_html(copy), doc.outer_html(li));
    assert_eq!(doc.rect(copy), doc.rect(li));

    let shallow = doc.clone_node(li, false);
    assert!(doc.children(shallow).is_empty());
}

#[test]
fn select_node_contents_targets_first_text() {
    let mut doc = Document::from_body_html("<h3><span>Title</span></h3>").unwrap();
    let h3 = doc.query_selector(doc.body(), &sel("h3")).unwrap();
    doc.select_node_contents(h3);

    let selection = doc.selection().copied().unwrap();
    assert_eq!(doc.text(selection.anchor.node), Some("Title"));
    assert_eq!((selection.anchor.offset, selection.focus.offset), (0, 5));
}

#[test]
fn properties_map_to_text_markup_and_attributes() {
    let mut doc = Document::from_body_html(r#"<a href="/old">old</a>"#).unwrap();
    let a = doc.query_selector(doc.body(), &sel("a")).unwrap();

    doc.set_property(a, "href", "/new").unwrap();
    doc.set_property(a, "innerText", "new").unwrap();
    assert_eq!(doc.property(a, "href").as_deref(), Some("/new"));
    assert_eq!(doc.property(a, "innerText").as_deref(), Some("new"));
    assert_eq!(doc.property(a, "tagName").as_deref(), Some("A"));

    doc.set_property(a, "innerHTML", "<em>x</em>").unwrap();
    assert_eq!(doc.outer_html(a), r#"<a href="/new"><em>x</em></a>"#);
}

#[test]
fn focus_events_do_not_bubble() {
    let doc = Document::from_body_html("<div><p>x</p></div>").unwrap();
    let p = doc.query_selector(doc.body(), &sel("p")).unwrap();

    assert_eq!(doc.propagation_path(p, EventKind::Focus), vec![p]);
    let click_path = doc.propagation_path(p, EventKind::Click);
    assert_eq!(click_path.first(), Some(&p));
    assert_eq!(click_path.last(), Some(&doc.root()));
}

#[test]
fn rect_margin_check_is_strict() {
    let rect = Rect::new(10., 10., 100., 50.);
    assert!(rect.contains_with_margin(0., 0., 16.));
    assert!(!rect.contains_with_margin(-6., 30., 16.));
    assert!(rect.contains_with_margin(125., 30., 16.));
    assert!(!rect.contains_with_margin(126., 30., 16.));
}
