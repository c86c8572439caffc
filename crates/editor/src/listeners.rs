use thingy_dom::{Document, EventKind, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordanceKind {
    /// Clones the element after itself.
    Plus,
    /// Removes the element and unregisters it.
    Minus,
}

/// What a listener does when its event reaches the node it is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerAction {
    /// Resolve and render tools for the focused element of `region`.
    ShowTools { region: NodeId },
    /// Emit the element's edited text, then stop propagation.
    DirectEdit,
    CloneOnCtrlEnter,
    SuppressEnter,
    PreventNavigation,
    /// Run the active tool at `index`.
    Tool { index: usize },
    PickImage { tool: usize, image: usize },
    Affordance { element: NodeId, kind: AffordanceKind },
    DragStart,
    DragMove,
    DragEnd,
    Proximity,
    FocusNearest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    pub node: NodeId,
    pub kind: EventKind,
    pub action: ListenerAction,
}

/// Listeners in attachment order.
#[derive(Debug, Default)]
pub struct ListenerTable {
    listeners: Vec<Listener>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `action`. Attaching an identical listener twice is a no-op.
    pub fn add(&mut self, node: NodeId, kind: EventKind, action: ListenerAction) {
        let listener = Listener { node, kind, action };
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    pub fn actions_for(&self, node: NodeId, kind: EventKind) -> Vec<ListenerAction> {
        self.listeners
            .iter()
            .filter(|l| l.node == node && l.kind == kind)
            .map(|l| l.action.clone())
            .collect()
    }

    pub fn has(&self, node: NodeId, kind: EventKind, action: &ListenerAction) -> bool {
        self.listeners
            .iter()
            .any(|l| l.node == node && l.kind == kind && &l.action == action)
    }

    pub fn remove_node(&mut self, node: NodeId) {
        self.listeners.retain(|l| l.node != node);
    }

    /// Drops listeners of nodes no longer attached to `document`.
    pub fn prune(&mut self, document: &Document) {
        self.listeners.retain(|l| document.is_connected(l.node));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.iter()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_listeners_are_attached_once() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.body(), p);

        let mut table = ListenerTable::new();
        table.add(p, EventKind::Click, ListenerAction::PreventNavigation);
        table.add(p, EventKind::Click, ListenerAction::PreventNavigation);
        table.add(p, EventKind::KeyUp, ListenerAction::DirectEdit);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.actions_for(p, EventKind::Click),
            vec![ListenerAction::PreventNavigation]
        );

        doc.remove(p);
        table.prune(&doc);
        assert!(table.is_empty());
    }
}
