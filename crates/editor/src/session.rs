use std::ops::ControlFlow;
use std::rc::Rc;

use indexmap::IndexMap;
use thingy_core::{
    Backend, BackendRegistry, ConfigError, EditableConfig, EditorConfig, KeyValueStorage,
    MemoryStorage, Operation, PathStore, RegionDescriptor, ToolEvent, ToolTable, emit,
};
use thingy_dom::{Document, DomEvent, EventKind, NodeId, SelectorList};
use tracing::{debug, warn};

use crate::controls::ActiveTool;
use crate::error::EditorError;
use crate::listeners::{ListenerAction, ListenerTable};
use crate::proximity::Affordances;

/// A registered editable element and its effective configuration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub element: NodeId,
    /// The region element the registration belongs to; the element itself
    /// for regions.
    pub region: NodeId,
    pub config: EditableConfig,
}

/// What happened to a dispatched event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

impl DispatchOutcome {
    fn merge(self, other: DispatchOutcome) -> Self {
        Self {
            default_prevented: self.default_prevented || other.default_prevented,
            propagation_stopped: self.propagation_stopped || other.propagation_stopped,
        }
    }
}

/// One editor instance: the document it edits, its editable registry,
/// listeners, tools and backends.
pub struct EditorSession {
    pub(crate) document: Document,
    pub(crate) config: EditorConfig,
    pub(crate) tools: ToolTable,
    pub(crate) backends: BackendRegistry,
    pub(crate) store: PathStore,
    pub(crate) registrations: Vec<Registration>,
    pub(crate) listeners: ListenerTable,
    pub(crate) active_tools: Vec<ActiveTool>,
    pub(crate) affordances: IndexMap<NodeId, Affordances>,
    /// Pointer offset from the toolbar's top-left corner while dragging.
    pub(crate) drag: Option<(f32, f32)>,
}

pub struct EditorSessionBuilder {
    document: Document,
    config: EditorConfig,
    storage: Option<Rc<dyn KeyValueStorage>>,
    backends: Vec<Box<dyn Backend>>,
}

impl EditorSessionBuilder {
    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Storage behind the `localStorage` backend. Defaults to a fresh
    /// [`MemoryStorage`].
    pub fn storage(mut self, storage: impl KeyValueStorage + 'static) -> Self {
        self.storage = Some(Rc::new(storage));
        self
    }

    /// Registers an additional backend, addressable by its id in config.
    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn build(self) -> Result<EditorSession, EditorError> {
        let storage = self
            .storage
            .unwrap_or_else(|| Rc::new(MemoryStorage::new()));
        let store = PathStore::from_shared(storage);
        let mut backends = BackendRegistry::with_store(store.clone());
        for backend in self.backends {
            backends.register(backend)?;
        }

        let mut tools = ToolTable::builtin();
        tools.extend(self.config.tools.clone());

        let mut session = EditorSession {
            document: self.document,
            config: self.config,
            tools,
            backends,
            store,
            registrations: Vec::new(),
            listeners: ListenerTable::new(),
            active_tools: Vec::new(),
            affordances: IndexMap::new(),
            drag: None,
        };
        let root = session.document.root();
        session
            .listeners
            .add(root, EventKind::MouseMove, ListenerAction::Proximity);
        session
            .listeners
            .add(root, EventKind::Click, ListenerAction::FocusNearest);
        Ok(session)
    }
}

impl EditorSession {
    pub fn builder(document: Document) -> EditorSessionBuilder {
        EditorSessionBuilder {
            document,
            config: EditorConfig::default(),
            storage: None,
            backends: Vec::new(),
        }
    }

    /// Builds a session over `document` and makes every region editable.
    pub fn editable(
        document: Document,
        regions: &[RegionDescriptor],
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let mut session = Self::builder(document).config(config).build()?;
        session.make_regions_editable(regions)?;
        Ok(session)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolTable {
        &self.tools
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    pub fn store(&self) -> &PathStore {
        &self.store
    }

    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn registration(&self, element: NodeId) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.element == element)
    }

    pub fn is_registered(&self, element: NodeId) -> bool {
        self.registration(element).is_some()
    }

    /// Cascades each region with the global config, validates it and makes
    /// every matching element editable. Creates the toolbar.
    pub fn make_regions_editable(
        &mut self,
        regions: &[RegionDescriptor],
    ) -> Result<(), EditorError> {
        for region in regions {
            let config = EditableConfig::cascade(&self.config, region);
            config.validate()?;
            for id in &config.backends {
                if !self.backends.contains(id) {
                    warn!(backend = %id, selector = %region.selector, "backend is not registered; dispatch will skip it");
                }
            }

            let selector = SelectorList::parse(&region.selector).map_err(ConfigError::from)?;
            let elements: Vec<NodeId> = self
                .document
                .query_selector_all(self.document.root(), &selector)
                .into_iter()
                .filter(|&el| !self.is_editor_chrome(el))
                .collect();
            if elements.is_empty() {
                debug!(selector = %region.selector, "region matches no elements");
            }
            for element in elements {
                self.make_editable(element, &config)?;
                self.disable_links(element);
            }
        }
        self.ensure_toolbar()?;
        Ok(())
    }

    /// Registers `element` and wires contenteditable, focus and direct-edit
    /// handling onto it, or onto each nested child when `config.nested` is
    /// set.
    pub fn make_editable(
        &mut self,
        element: NodeId,
        config: &EditableConfig,
    ) -> Result<(), EditorError> {
        self.register(element, element, config.clone());
        self.document.set_style(element, "cursor", "pointer");

        if config.nested.is_empty() {
            self.wire_editable(element, element);
        } else {
            for nested in &config.nested {
                let selector =
                    SelectorList::parse(nested.selector()).map_err(ConfigError::from)?;
                let child_config = config.for_nested(nested);
                for child in self.document.query_selector_all(element, &selector) {
                    self.wire_editable(child, element);
                    self.register(child, element, child_config.clone());
                    self.document.set_style(child, "cursor", "pointer");
                }
            }
        }

        if config.repeatable {
            self.listeners
                .add(element, EventKind::KeyPress, ListenerAction::CloneOnCtrlEnter);
        }
        if config.disallow_default_enter {
            self.listeners
                .add(element, EventKind::KeyPress, ListenerAction::SuppressEnter);
        }
        Ok(())
    }

    fn wire_editable(&mut self, element: NodeId, region: NodeId) {
        self.document.set_attribute(element, "contenteditable", "true");
        self.document.set_attribute(element, "tabindex", "0");
        self.listeners
            .add(element, EventKind::Focus, ListenerAction::ShowTools { region });
        self.listeners
            .add(element, EventKind::KeyUp, ListenerAction::DirectEdit);
    }

    /// Suppresses navigation for `element` if it is a link, and for every
    /// link inside it.
    pub fn disable_links(&mut self, element: NodeId) {
        let mut links = Vec::new();
        if self.document.tag_name(element) == Some("a") {
            links.push(element);
        }
        links.extend(
            self.document
                .descendants(element)
                .into_iter()
                .filter(|&n| self.document.tag_name(n) == Some("a")),
        );
        for link in links {
            self.listeners
                .add(link, EventKind::Click, ListenerAction::PreventNavigation);
        }
    }

    /// Deep-clones `element` after itself and selects the contents of the
    /// clone's first nested editable.
    pub fn clone_editable(&mut self, element: NodeId, config: &EditableConfig) -> Option<NodeId> {
        self.document.parent(element)?;
        let clone = self.document.clone_node(element, true);
        self.document.insert_after(element, clone);

        let selectors: Vec<SelectorList> = config
            .nested
            .iter()
            .filter_map(|n| SelectorList::parse(n.selector()).ok())
            .collect();
        let first_nested = self
            .document
            .descendants(clone)
            .into_iter()
            .find(|&n| selectors.iter().any(|s| self.document.matches(n, s)));
        if let Some(child) = first_nested {
            self.document.select_node_contents(child);
        }
        debug!(%element, %clone, "cloned editable");
        Some(clone)
    }

    /// Records `config` as the effective configuration of `element`,
    /// replacing any earlier registration.
    pub fn register(&mut self, element: NodeId, region: NodeId, config: EditableConfig) {
        let registration = Registration {
            element,
            region,
            config,
        };
        match self.registrations.iter_mut().find(|r| r.element == element) {
            Some(existing) => *existing = registration,
            None => self.registrations.push(registration),
        }
    }

    /// Forgets `element` and every registered element inside it.
    pub fn unregister(&mut self, element: NodeId) {
        let removed: Vec<NodeId> = self
            .registrations
            .iter()
            .filter(|r| self.document.contains(element, r.element))
            .map(|r| r.element)
            .collect();
        for node in &removed {
            self.hide_affordances(*node);
        }
        self.registrations
            .retain(|r| !removed.contains(&r.element));
        self.listeners.prune(&self.document);
    }

    pub fn emit(&mut self, event: &ToolEvent, config: &EditableConfig) -> Result<(), EditorError> {
        emit(&mut self.document, &self.backends, event, config)?;
        Ok(())
    }

    /// Runs the listeners along `event`'s propagation path, innermost first.
    pub fn dispatch(&mut self, event: DomEvent) -> Result<DispatchOutcome, EditorError> {
        let mut outcome = DispatchOutcome::default();
        for node in self.document.propagation_path(event.target, event.kind) {
            for action in self.listeners.actions_for(node, event.kind) {
                if self.run_listener(node, action, &event, &mut outcome)?.is_break() {
                    outcome.propagation_stopped = true;
                    return Ok(outcome);
                }
            }
        }
        Ok(outcome)
    }

    fn run_listener(
        &mut self,
        node: NodeId,
        action: ListenerAction,
        event: &DomEvent,
        outcome: &mut DispatchOutcome,
    ) -> Result<ControlFlow<()>, EditorError> {
        match action {
            ListenerAction::ShowTools { region } => self.display_tools(node, region)?,
            ListenerAction::DirectEdit => {
                self.direct_edit(node, event)?;
                return Ok(ControlFlow::Break(()));
            }
            ListenerAction::CloneOnCtrlEnter => {
                if event.is_enter() && event.ctrl_key {
                    outcome.default_prevented = true;
                    self.clone_on_ctrl_enter(node, event)?;
                }
            }
            ListenerAction::SuppressEnter => {
                if event.is_enter() {
                    outcome.default_prevented = true;
                }
            }
            ListenerAction::PreventNavigation => outcome.default_prevented = true,
            ListenerAction::Tool { index } => self.run_tool(index, event)?,
            ListenerAction::PickImage { tool, image } => self.pick_image(tool, image, event)?,
            ListenerAction::Affordance { element, kind } => self.on_affordance(element, kind)?,
            ListenerAction::DragStart => {
                if let Some(pointer) = event.pointer {
                    outcome.default_prevented = true;
                    self.start_drag(pointer);
                }
            }
            ListenerAction::DragMove => {
                if let Some(pointer) = event.pointer {
                    if self.drag_to(pointer) {
                        outcome.default_prevented = true;
                    }
                }
            }
            ListenerAction::DragEnd => self.end_drag(),
            ListenerAction::Proximity => {
                if let Some(pointer) = event.pointer {
                    self.update_proximity(pointer)?;
                }
            }
            ListenerAction::FocusNearest => {
                if let Some(pointer) = event.pointer {
                    self.focus_nearest(pointer, event.target)?;
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn direct_edit(&mut self, element: NodeId, event: &DomEvent) -> Result<(), EditorError> {
        let Some(config) = self.registration(element).map(|r| r.config.clone()) else {
            return Ok(());
        };
        let text = self.document.inner_text(element);
        let tool_event = ToolEvent::new(element, Operation::text(text)).dom_event(event.clone());
        self.emit(&tool_event, &config)
    }

    fn clone_on_ctrl_enter(&mut self, region: NodeId, event: &DomEvent) -> Result<(), EditorError> {
        let Some(config) = self.registration(region).map(|r| r.config.clone()) else {
            return Ok(());
        };
        let editable = if config.clone_focused_element {
            self.element_or_parent(event.target)
        } else {
            region
        };
        let config = self
            .registration(editable)
            .map(|r| r.config.clone())
            .unwrap_or(config);
        if let Some(clone) = self.clone_editable(editable, &config) {
            self.make_editable(clone, &config)?;
            self.disable_links(clone);
        }
        Ok(())
    }

    pub(crate) fn element_or_parent(&self, node: NodeId) -> NodeId {
        if self.document.is_element(node) {
            node
        } else {
            self.document.parent_element(node).unwrap_or(node)
        }
    }

    /// Focuses `element` and fires its focus listeners.
    pub fn focus(&mut self, element: NodeId) -> Result<DispatchOutcome, EditorError> {
        if !self.document.is_element(element) || !self.document.is_connected(element) {
            return Ok(DispatchOutcome::default());
        }
        self.document.focus(element);
        self.dispatch(DomEvent::focus(element))
    }

    pub fn click(&mut self, target: NodeId) -> Result<DispatchOutcome, EditorError> {
        self.dispatch(DomEvent::click(target))
    }

    pub fn click_at(&mut self, target: NodeId, x: f32, y: f32) -> Result<DispatchOutcome, EditorError> {
        self.dispatch(DomEvent::click(target).at(x, y))
    }

    pub fn key_up(&mut self, target: NodeId, key: &str) -> Result<DispatchOutcome, EditorError> {
        self.dispatch(DomEvent::key_up(target, key))
    }

    pub fn key_press(
        &mut self,
        target: NodeId,
        key: &str,
        ctrl: bool,
    ) -> Result<DispatchOutcome, EditorError> {
        let event = DomEvent::key_press(target, key);
        self.dispatch(if ctrl { event.with_ctrl() } else { event })
    }

    /// Replaces the text of `element` the way typing would, then fires keyup.
    pub fn edit_text(&mut self, element: NodeId, text: &str) -> Result<DispatchOutcome, EditorError> {
        self.document.set_inner_text(element, text);
        self.key_up(element, "Unidentified")
    }

    /// Sets the value of a form control and fires `input` then `keyup`.
    pub fn fill(&mut self, control: NodeId, value: &str) -> Result<DispatchOutcome, EditorError> {
        self.document.set_attribute(control, "value", value);
        let input = self.dispatch(DomEvent::new(EventKind::Input, control))?;
        let key_up = self.key_up(control, "Unidentified")?;
        Ok(input.merge(key_up))
    }

    pub fn move_pointer(&mut self, x: f32, y: f32) -> Result<DispatchOutcome, EditorError> {
        let root = self.document.root();
        self.dispatch(DomEvent::mouse(EventKind::MouseMove, root, x, y))
    }

    pub fn press(&mut self, target: NodeId, x: f32, y: f32) -> Result<DispatchOutcome, EditorError> {
        self.dispatch(DomEvent::mouse(EventKind::MouseDown, target, x, y))
    }

    pub fn release(&mut self, x: f32, y: f32) -> Result<DispatchOutcome, EditorError> {
        let root = self.document.root();
        self.dispatch(DomEvent::mouse(EventKind::MouseUp, root, x, y))
    }
}
