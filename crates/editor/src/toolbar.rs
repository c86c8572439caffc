use thingy_core::{ConfigError, EditableConfig};
use thingy_dom::{Document, EventKind, NodeId, Rect, SelectorList};
use tracing::debug;

use crate::error::EditorError;
use crate::listeners::ListenerAction;
use crate::proximity::AFFORDANCE_CLASS;
use crate::session::EditorSession;

pub const TOOLBAR_ID: &str = "te-toolbar";
pub const TOOLS_ID: &str = "te-tools";
pub const DRAG_HANDLE_CLASS: &str = "drag-handle";
pub const NO_TOOLS_MESSAGE: &str = "No tools for this element";
pub const BREADCRUMB_SEPARATOR: &str = " \u{bb} ";

/// The floating toolbar panel: a drag handle, a breadcrumb header and the
/// container tools are rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toolbar {
    pub element: NodeId,
    pub handle: NodeId,
    pub header: NodeId,
    pub tools: NodeId,
}

impl Toolbar {
    /// Finds an existing toolbar in `document`.
    pub fn locate(document: &Document) -> Option<Self> {
        let element = document.get_element_by_id(TOOLBAR_ID)?;
        let handle = document
            .children(element)
            .iter()
            .copied()
            .find(|&n| document.has_class(n, DRAG_HANDLE_CLASS))?;
        let header = document
            .children(element)
            .iter()
            .copied()
            .find(|&n| document.tag_name(n) == Some("header"))?;
        let tools = document
            .children(element)
            .iter()
            .copied()
            .find(|&n| document.element_id(n) == Some(TOOLS_ID))?;
        Some(Self {
            element,
            handle,
            header,
            tools,
        })
    }

    pub fn breadcrumb(&self, document: &Document) -> String {
        document.inner_text(self.header)
    }

    pub fn position(&self, document: &Document) -> (f32, f32) {
        let rect = document.rect(self.element);
        (rect.left, rect.top)
    }
}

impl EditorSession {
    pub fn toolbar(&self) -> Option<Toolbar> {
        Toolbar::locate(&self.document)
    }

    /// Creates the toolbar under the configured mount point unless one is
    /// already present.
    pub fn ensure_toolbar(&mut self) -> Result<Toolbar, EditorError> {
        if let Some(toolbar) = Toolbar::locate(&self.document) {
            return Ok(toolbar);
        }
        let mount = self.mount_point()?;
        let doc = &mut self.document;

        let element = doc.create_element("aside");
        doc.set_attribute(element, "id", TOOLBAR_ID);
        doc.add_class(element, "te-toolbar");
        doc.set_style(element, "cursor", "move");

        let handle = doc.create_element("h3");
        doc.add_class(handle, DRAG_HANDLE_CLASS);
        doc.set_inner_text(handle, "TOOLBAR");
        let header = doc.create_element("header");
        let tools = doc.create_element("div");
        doc.set_attribute(tools, "id", TOOLS_ID);

        doc.append_child(element, handle);
        doc.append_child(element, header);
        doc.append_child(element, tools);
        doc.append_child(mount, element);

        let root = doc.root();
        self.listeners
            .add(handle, EventKind::MouseDown, ListenerAction::DragStart);
        self.listeners
            .add(root, EventKind::MouseMove, ListenerAction::DragMove);
        self.listeners
            .add(root, EventKind::MouseUp, ListenerAction::DragEnd);

        debug!(%element, %mount, "created toolbar");
        Ok(Toolbar {
            element,
            handle,
            header,
            tools,
        })
    }

    /// The element matched by `appendToolbarTo`.
    pub(crate) fn mount_point(&self) -> Result<NodeId, ConfigError> {
        let selector = SelectorList::parse(&self.config.append_toolbar_to)?;
        self.document
            .query_selector(self.document.root(), &selector)
            .ok_or_else(|| ConfigError::UnknownMountPoint {
                selector: self.config.append_toolbar_to.clone(),
            })
    }

    /// Whether `node` is part of the toolbar or an affordance control.
    pub(crate) fn is_editor_chrome(&self, node: NodeId) -> bool {
        let in_toolbar = Toolbar::locate(&self.document)
            .is_some_and(|toolbar| self.document.contains(toolbar.element, node));
        in_toolbar
            || std::iter::once(node)
                .chain(self.document.ancestors(node))
                .any(|n| self.document.has_class(n, AFFORDANCE_CLASS))
    }

    pub(crate) fn update_breadcrumb(
        &mut self,
        toolbar: Toolbar,
        focused: NodeId,
        region_config: &EditableConfig,
    ) {
        let mut parts = vec![region_config.selector.as_str()];
        let nested = region_config.nested.iter().find(|nested| {
            SelectorList::parse(nested.selector())
                .is_ok_and(|s| self.document.matches(focused, &s))
        });
        if let Some(nested) = nested {
            parts.push(nested.selector());
        }
        let text = parts.join(BREADCRUMB_SEPARATOR);
        self.document.set_inner_text(toolbar.header, &text);
    }

    pub(crate) fn start_drag(&mut self, (x, y): (f32, f32)) {
        let Some(toolbar) = self.toolbar() else {
            return;
        };
        let rect = self.document.rect(toolbar.element);
        self.drag = Some((x - rect.left, y - rect.top));
    }

    /// Moves the toolbar with the pointer. Returns whether a drag is active.
    pub(crate) fn drag_to(&mut self, (x, y): (f32, f32)) -> bool {
        let (Some((dx, dy)), Some(toolbar)) = (self.drag, self.toolbar()) else {
            return false;
        };
        let (left, top) = (x - dx, y - dy);
        let rect = self.document.rect(toolbar.element);
        self.document
            .set_style(toolbar.element, "left", format!("{left}px"));
        self.document
            .set_style(toolbar.element, "top", format!("{top}px"));
        self.document.set_rect(
            toolbar.element,
            Rect::new(left, top, rect.width, rect.height),
        );
        true
    }

    pub(crate) fn end_drag(&mut self) {
        self.drag = None;
    }
}
