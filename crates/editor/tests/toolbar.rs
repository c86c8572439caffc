use thingy_core::{EditorConfig, RegionDescriptor};
use thingy_dom::{Document, NodeId, Rect, SelectorList};
use thingy_editor::{EditorSession, TOOLBAR_ID};

fn find(doc: &Document, selector: &str) -> NodeId {
    doc.query_selector(doc.root(), &SelectorList::parse(selector).unwrap())
        .unwrap()
}

fn session(html: &str, regions: &[RegionDescriptor]) -> EditorSession {
    let doc = Document::from_body_html(html).unwrap();
    EditorSession::editable(doc, regions, EditorConfig::new()).unwrap()
}

#[test]
fn toolbar_is_created_once() {
    let mut session = session("<main><p>x</p></main>", &[RegionDescriptor::new("p")]);
    session
        .make_regions_editable(&[RegionDescriptor::new("main")])
        .unwrap();

    let bars = session
        .document()
        .query_selector_all(session.document().root(), &SelectorList::parse("aside").unwrap());
    assert_eq!(bars.len(), 1);

    let toolbar = session.toolbar().unwrap();
    let doc = session.document();
    assert_eq!(doc.element_id(toolbar.element), Some(TOOLBAR_ID));
    assert_eq!(doc.parent(toolbar.element), Some(doc.body()));
    assert_eq!(
        doc.outer_html(toolbar.element),
        r#"<aside id="te-toolbar" class="te-toolbar" style="cursor: move"><h3 class="drag-handle">TOOLBAR</h3><header></header><div id="te-tools"></div></aside>"#
    );
}

#[test]
fn toolbar_mounts_under_configured_element() {
    let doc = Document::from_body_html(r#"<div id="chrome"></div><p>x</p>"#).unwrap();
    let session = EditorSession::editable(
        doc,
        &[RegionDescriptor::new("p")],
        EditorConfig::new().append_toolbar_to("#chrome"),
    )
    .unwrap();

    let chrome = find(session.document(), "#chrome");
    let toolbar = session.toolbar().unwrap();
    assert_eq!(session.document().parent(toolbar.element), Some(chrome));
}

#[test]
fn dragging_the_handle_moves_the_toolbar() {
    let mut session = session("<p>x</p>", &[RegionDescriptor::new("p")]);
    let toolbar = session.toolbar().unwrap();
    session
        .document_mut()
        .set_rect(toolbar.element, Rect::new(10., 10., 200., 100.));

    // Moving without a drag in progress does nothing.
    session.move_pointer(300., 300.).unwrap();
    assert_eq!(toolbar.position(session.document()), (10., 10.));

    assert!(session.press(toolbar.handle, 20., 15.).unwrap().default_prevented);
    session.move_pointer(120., 65.).unwrap();

    let doc = session.document();
    assert_eq!(doc.style(toolbar.element, "left").as_deref(), Some("110px"));
    assert_eq!(doc.style(toolbar.element, "top").as_deref(), Some("60px"));
    assert_eq!(toolbar.position(doc), (110., 60.));

    session.release(120., 65.).unwrap();
    session.move_pointer(400., 400.).unwrap();
    assert_eq!(toolbar.position(session.document()), (110., 60.));
}

#[test]
fn pointer_proximity_outlines_editables() {
    let mut session = session(
        "<p>near</p><p>far</p>",
        &[RegionDescriptor::new("p")],
    );
    let paragraphs = session
        .document()
        .query_selector_all(session.document().body(), &SelectorList::parse("p").unwrap());
    let (near, far) = (paragraphs[0], paragraphs[1]);
    session
        .document_mut()
        .set_rect(near, Rect::new(0., 0., 100., 20.));
    session
        .document_mut()
        .set_rect(far, Rect::new(0., 500., 100., 20.));

    session.move_pointer(110., 10.).unwrap();
    let doc = session.document();
    assert_eq!(doc.style(near, "outline").as_deref(), Some("16px solid red"));
    assert_eq!(doc.style(far, "outline").as_deref(), Some("initial"));

    session.move_pointer(300., 300.).unwrap();
    assert_eq!(
        session.document().style(near, "outline").as_deref(),
        Some("initial")
    );
}

#[test]
fn affordances_clone_and_remove_repeatable_items() {
    let mut session = session(
        "<ul><li>One</li><li>Two</li></ul>",
        &[RegionDescriptor::new("li").repeatable(true)],
    );
    let ul = find(session.document(), "ul");
    let items = session.document().children(ul).to_vec();
    session
        .document_mut()
        .set_rect(items[0], Rect::new(0., 0., 100., 20.));
    session
        .document_mut()
        .set_rect(items[1], Rect::new(0., 400., 100., 20.));

    // Within the outline margin plus the affordance size.
    session.move_pointer(150., 10.).unwrap();
    let affordances = session.affordances(items[0]).unwrap();
    assert!(session.affordances(items[1]).is_none());

    let doc = session.document();
    assert_eq!(doc.inner_text(affordances.minus), "\u{2212}");
    assert_eq!(doc.inner_text(affordances.plus), "+");
    assert_eq!(doc.style(affordances.minus, "left").as_deref(), Some("116px"));
    assert_eq!(doc.style(affordances.plus, "top").as_deref(), Some("-32px"));

    session.click(affordances.plus).unwrap();
    assert_eq!(session.document().children(ul).len(), 3);
    let clone = session.document().children(ul)[1];
    assert_eq!(session.document().inner_text(clone), "One");
    assert!(session.is_registered(clone));

    session.click(affordances.minus).unwrap();
    let remaining = session.document().children(ul).to_vec();
    assert_eq!(remaining, vec![clone, items[1]]);
    assert!(!session.is_registered(items[0]));
    assert!(session.affordances(items[0]).is_none());
    assert!(!session.document().is_connected(affordances.plus));
}

#[test]
fn affordances_hide_when_pointer_leaves() {
    let mut session = session(
        "<ol><li>One</li></ol>",
        &[RegionDescriptor::new("li").repeatable(true)],
    );
    let li = find(session.document(), "li");
    session
        .document_mut()
        .set_rect(li, Rect::new(0., 0., 100., 20.));

    session.move_pointer(50., 50.).unwrap();
    let shown = session.affordances(li).unwrap();

    session.move_pointer(500., 500.).unwrap();
    assert!(session.affordances(li).is_none());
    assert!(!session.document().is_connected(shown.minus));
}

#[test]
fn clicks_focus_the_deepest_nearby_editable() {
    let mut session = session(
        r#"<section class="outer"><div class="inner">x</div></section>"#,
        &[
            RegionDescriptor::new("section.outer"),
            RegionDescriptor::new("div.inner"),
        ],
    );
    let outer = find(session.document(), "section.outer");
    let inner = find(session.document(), "div.inner");
    session
        .document_mut()
        .set_rect(outer, Rect::new(0., 0., 400., 400.));
    session
        .document_mut()
        .set_rect(inner, Rect::new(50., 50., 100., 100.));

    let body = session.document().body();
    session.click_at(body, 60., 60.).unwrap();
    assert_eq!(session.document().active_element(), Some(inner));
    let toolbar = session.toolbar().unwrap();
    assert_eq!(toolbar.breadcrumb(session.document()), "div.inner");

    session.click_at(body, 300., 300.).unwrap();
    assert_eq!(session.document().active_element(), Some(outer));
    assert_eq!(toolbar.breadcrumb(session.document()), "section.outer");

    // Clicks on the toolbar never move focus.
    session.click_at(toolbar.handle, 60., 60.).unwrap();
    assert_eq!(session.document().active_element(), Some(outer));
}
