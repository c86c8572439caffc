use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::EventKind;
use crate::selection::Selection;
use crate::selector::SelectorList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Bounding box in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0. || self.height <= 0.
    }

    /// Strict containment of `(x, y)` in the box grown by `margin` on every side.
    pub fn contains_with_margin(&self, x: f32, y: f32, margin: f32) -> bool {
        x > self.left - margin
            && x < self.right() + margin
            && y > self.top - margin
            && y < self.bottom() + margin
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    rect: Rect,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            rect: Rect::default(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeSlot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed node tree. Detached nodes stay allocated until the document
/// is dropped, so a [`NodeId`] never dangles.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeSlot>,
    root: NodeId,
    body: NodeId,
    selection: Option<Selection>,
    active_element: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            selection: None,
            active_element: None,
        };
        doc.root = doc.alloc(NodeData::Document);
        let body = doc.create_element("body");
        doc.append_child(doc.root, body);
        doc.body = body;
        doc
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSlot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn slot(&self, id: NodeId) -> &NodeSlot {
        &self.nodes[id.0]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut NodeSlot {
        &mut self.nodes[id.0]
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.slot_mut(id).data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.slot(id).data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeData::Text(existing) = &mut self.slot_mut(id).data {
            *existing = text.into();
        }
    }

    // Tree navigation

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    /// Closest ancestor that is an element (never the document node).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let ix = self.index_in_parent(id)?;
        self.children(parent).get(ix + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let ix = self.index_in_parent(id)?;
        ix.checked_sub(1)
            .and_then(|prev| self.children(parent).get(prev).copied())
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Inclusive: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    // Mutation

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Inserts `child` under `parent` before `reference`, or at the end when
    /// `reference` is `None` or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.contains(child, parent) {
            tracing::warn!(%parent, %child, "refusing to insert a node into its own subtree");
            return;
        }
        self.remove(child);
        let children = &mut self.slot_mut(parent).children;
        let ix = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(ix, child);
        self.slot_mut(child).parent = Some(parent);
    }

    pub fn insert_after(&mut self, node: NodeId, new_node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let reference = self.next_sibling(node);
        self.insert_before(parent, new_node, reference);
    }

    /// Detaches `id` from its parent. The subtree stays intact.
    pub fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.slot(id).parent else {
            return;
        };
        self.slot_mut(parent).children.retain(|&c| c != id);
        self.slot_mut(id).parent = None;
        if self.active_element.is_some_and(|active| self.contains(id, active)) {
            self.active_element = None;
        }
    }

    pub fn remove_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
    }

    /// Copies `id` into a new detached node; `deep` copies the whole subtree.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> NodeId {
        let data = self.data(id).clone();
        let copy = self.alloc(data);
        if deep {
            for child in self.children(id).to_vec() {
                let child_copy = self.clone_node(child, true);
                self.append_child(copy, child_copy);
            }
        }
        copy
    }

    // Attributes

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let Some(el) = self.element_mut(id) else {
            return;
        };
        match el.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => el.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(k, _)| k != name);
        }
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, "id")
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attribute(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let next = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", next);
    }

    // Inline style, stored in the `style` attribute.

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        parse_declarations(self.attribute(id, "style")?)
            .into_iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v)
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: impl Into<String>) {
        if !self.is_element(id) {
            return;
        }
        let value = value.into();
        let mut decls = parse_declarations(self.attribute(id, "style").unwrap_or_default());
        match decls.iter_mut().find(|(k, _)| k == property) {
            Some((_, existing)) => *existing = value,
            None => decls.push((property.to_string(), value)),
        }
        self.set_attribute(id, "style", serialize_declarations(&decls));
    }

    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        let Some(existing) = self.attribute(id, "style") else {
            return;
        };
        let mut decls = parse_declarations(existing);
        decls.retain(|(k, _)| k != property);
        if decls.is_empty() {
            self.remove_attribute(id, "style");
        } else {
            self.set_attribute(id, "style", serialize_declarations(&decls));
        }
    }

    // Geometry

    pub fn rect(&self, id: NodeId) -> Rect {
        self.element(id).map(|el| el.rect).unwrap_or_default()
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        if let Some(el) = self.element_mut(id) {
            el.rect = rect;
        }
    }

    // Text

    pub fn text_content(&self, id: NodeId) -> String {
        match self.data(id) {
            NodeData::Text(text) => text.clone(),
            _ => self
                .descendants(id)
                .into_iter()
                .filter_map(|n| self.text(n))
                .collect(),
        }
    }

    pub fn inner_text(&self, id: NodeId) -> String {
        self.text_content(id)
    }

    pub fn set_inner_text(&mut self, id: NodeId, text: &str) {
        if self.is_text(id) {
            self.set_text(id, text);
            return;
        }
        self.remove_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    /// Reads an element property the way script would see it.
    pub fn property(&self, id: NodeId, name: &str) -> Option<String> {
        match name {
            "innerText" | "textContent" => Some(self.text_content(id)),
            "innerHTML" => Some(self.inner_html(id)),
            "tagName" => self.tag_name(id).map(str::to_ascii_uppercase),
            "id" => self.element_id(id).map(str::to_string),
            "className" => self.attribute(id, "class").map(str::to_string),
            _ => self.attribute(id, name).map(str::to_string),
        }
    }

    /// Assigns an element property. Anything that is not a text or markup
    /// property is reflected as an attribute.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), crate::HtmlError> {
        match name {
            "innerText" | "textContent" => self.set_inner_text(id, value),
            "innerHTML" => self.set_inner_html(id, value)?,
            "className" => self.set_attribute(id, "class", value),
            _ => self.set_attribute(id, name, value),
        }
        Ok(())
    }

    // Queries

    pub fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
        selector.matches(self, id)
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    pub fn query_selector(&self, scope: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| selector.matches(self, n))
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.element_id(n) == Some(element_id))
    }

    // Focus and selection

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn focus(&mut self, id: NodeId) {
        if self.is_element(id) && self.is_connected(id) {
            self.active_element = Some(id);
        }
    }

    pub fn blur(&mut self) {
        self.active_element = None;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Target first, then ancestors up to the document node when `kind`
    /// bubbles.
    pub fn propagation_path(&self, target: NodeId, kind: EventKind) -> Vec<NodeId> {
        let mut path = vec![target];
        if kind.bubbles() {
            path.extend(self.ancestors(target));
        }
        path
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            (!k.is_empty()).then(|| (k.to_string(), v.trim().to_string()))
        })
        .collect()
}

fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}
