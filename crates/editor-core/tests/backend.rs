use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use thingy_core::{
    Backend, BackendError, BackendRegistry, DispatchError, DomBackend, EditableConfig,
    EditorConfig, MemoryStorage, Operation, PathStore, RegionDescriptor, StoreBackend, ToolEvent,
    emit,
};
use thingy_dom::{Document, NodeId, Selection, SelectorList};

/// Records every operation it receives.
struct Recorder {
    seen: Rc<RefCell<Vec<Operation>>>,
}

impl Backend for Recorder {
    fn id(&self) -> &str {
        "recorder"
    }

    fn apply(
        &self,
        _document: &mut Document,
        _element: NodeId,
        operation: &Operation,
        _config: &EditableConfig,
    ) -> Result<(), BackendError> {
        self.seen.borrow_mut().push(operation.clone());
        Ok(())
    }
}

fn page(html: &str) -> Document {
    Document::from_body_html(html).unwrap()
}

fn find(doc: &Document, selector: &str) -> NodeId {
    doc.query_selector(doc.body(), &SelectorList::parse(selector).unwrap())
        .unwrap()
}

fn config(global: EditorConfig) -> EditableConfig {
    EditableConfig::cascade(&global, &RegionDescriptor::new("main"))
}

#[test]
fn unknown_backend_does_not_block_the_rest() {
    let mut doc = page(r#"<main><a href="/old">old</a></main>"#);
    let a = find(&doc, "a");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut registry = BackendRegistry::default();
    registry.register(Box::new(DomBackend)).unwrap();
    registry
        .register(Box::new(Recorder { seen: seen.clone() }))
        .unwrap();

    let config = config(EditorConfig::new().backends(["missing", "recorder"]));
    assert_eq!(config.backends, vec!["dom", "missing", "recorder"]);

    let op = Operation::field("href", "/new");
    emit(&mut doc, &registry, &ToolEvent::new(a, op.clone()), &config).unwrap();

    assert_eq!(doc.attribute(a, "href"), Some("/new"));
    assert_eq!(*seen.borrow(), vec![op]);
}

#[test]
fn missing_path_attribute_skips_only_the_store() {
    let mut doc = page(r#"<main><h3>Title</h3></main>"#);
    let h3 = find(&doc, "h3");
    let storage = MemoryStorage::new();
    let registry = BackendRegistry::with_store(PathStore::new(storage.clone()));
    let config = config(
        EditorConfig::new()
            .backends(["localStorage"])
            .top_level_key("site"),
    );

    let event = ToolEvent::new(h3, Operation::field("innerText", "New"));
    emit(&mut doc, &registry, &event, &config).unwrap();

    assert_eq!(doc.inner_text(h3), "New");
    assert!(storage.is_empty());
}

#[test]
fn store_backend_merges_at_element_path() {
    let mut doc = page(r#"<main><h3 data-thingy-path="projects 0 title">Title</h3></main>"#);
    let h3 = find(&doc, "h3");
    let store = PathStore::new(MemoryStorage::new());
    store
        .save("site", &json!({"projects": [{"title": {"innerText": "Title"}, "year": 2020}]}))
        .unwrap();
    let registry = BackendRegistry::with_store(store.clone());
    let config = config(
        EditorConfig::new()
            .backends(["localStorage"])
            .top_level_key("site"),
    );

    let event = ToolEvent::new(h3, Operation::text("Edited"));
    emit(&mut doc, &registry, &event, &config).unwrap();

    assert_eq!(
        store.get("site"),
        Some(json!({"projects": [{"title": {"innerText": "Edited"}, "year": 2020}]}))
    );
    // In-place edits are never written back to the element.
    assert_eq!(doc.inner_text(h3), "Title");
}

#[test]
fn missing_top_level_key_aborts_dispatch() {
    let mut doc = page(r#"<main><p data-thingy-path="intro">x</p></main>"#);
    let p = find(&doc, "p");
    let registry = BackendRegistry::with_store(PathStore::new(MemoryStorage::new()));
    let config = config(EditorConfig::new().backends(["localStorage"]));

    let err = emit(&mut doc, &registry, &ToolEvent::new(p, "y".into()), &config).unwrap_err();
    assert!(matches!(err, DispatchError::Config(_)));
}

#[test]
fn later_backends_see_the_original_operation() {
    let mut doc = page("<main><p>bold me</p></main>");
    let p = find(&doc, "p");
    let text = doc.first_child(p).unwrap();
    doc.set_selection(Some(Selection::within(text, 0, 4)));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let backends: Vec<Box<dyn Backend>> = vec![
        Box::new(DomBackend),
        Box::new(Recorder { seen: seen.clone() }),
    ];
    let registry = BackendRegistry::new(backends).unwrap();
    let config = config(EditorConfig::new().backends(["recorder"]));

    let op = Operation::format("bold", None).then(Operation::text("bold me"));
    emit(&mut doc, &registry, &ToolEvent::new(p, op.clone()), &config).unwrap();

    assert_eq!(doc.inner_html(p), "<b>bold</b> me");
    assert_eq!(*seen.borrow(), vec![op]);
}

#[test]
fn duplicate_backend_ids_are_rejected() {
    let mut registry = BackendRegistry::with_store(PathStore::new(MemoryStorage::new()));
    assert!(registry.register(Box::new(DomBackend)).is_err());
    assert!(
        registry
            .register(Box::new(StoreBackend::new(PathStore::new(MemoryStorage::new()))))
            .is_err()
    );
    assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["dom", "localStorage"]);
}
