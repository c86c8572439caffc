use thiserror::Error;

use crate::document::{Document, NodeId};

/// One end of a selection. `offset` counts characters within a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Boundary,
    pub focus: Boundary,
}

impl Selection {
    pub fn new(anchor: Boundary, focus: Boundary) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(at: Boundary) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    /// Selects `start..end` characters of a single text node.
    pub fn within(node: NodeId, start: usize, end: usize) -> Self {
        Self::new(Boundary::new(node, start), Boundary::new(node, end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("there is no active selection")]
    NoSelection,
    #[error("selection is collapsed")]
    Collapsed,
    #[error("selection spans more than one node")]
    SpansMultipleNodes,
    #[error("selection endpoint {0} is not a text node")]
    NotText(NodeId),
    #[error("selected text node {0} is detached")]
    Detached(NodeId),
}

impl Document {
    /// Places the caret over the contents of `node`.
    ///
    /// Selections only address text, so for an element this selects the
    /// whole of its first descendant text node, or collapses onto the element
    /// when it has none.
    pub fn select_node_contents(&mut self, node: NodeId) {
        let text_node = if self.is_text(node) {
            Some(node)
        } else {
            self.descendants(node).into_iter().find(|&n| self.is_text(n))
        };
        let selection = match text_node {
            Some(text_node) => {
                let len = self.text(text_node).map_or(0, |t| t.chars().count());
                Selection::within(text_node, 0, len)
            }
            None => Selection::collapsed(Boundary::new(node, 0)),
        };
        self.set_selection(Some(selection));
    }

    /// Wraps the selected text in a new `tag` element carrying `attrs`.
    ///
    /// The text node holding the selection is replaced by
    /// `[before, <tag>selected</tag>, after]`, skipping empty text pieces.
    /// Only selections confined to a single text node are supported. On
    /// success the selection covers the wrapped text and the new element is
    /// returned.
    pub fn surround_selection(
        &mut self,
        tag: &str,
        attrs: &[(String, String)],
    ) -> Result<NodeId, SelectionError> {
        let selection = *self.selection().ok_or(SelectionError::NoSelection)?;
        if selection.anchor.node != selection.focus.node {
            return Err(SelectionError::SpansMultipleNodes);
        }
        let node = selection.focus.node;
        let text = self
            .text(node)
            .ok_or(SelectionError::NotText(node))?
            .to_string();
        let parent = self.parent(node).ok_or(SelectionError::Detached(node))?;

        let len = text.chars().count();
        let start = selection.anchor.offset.min(selection.focus.offset).min(len);
        let end = selection.anchor.offset.max(selection.focus.offset).min(len);
        if start == end {
            return Err(SelectionError::Collapsed);
        }

        let before: String = text.chars().take(start).collect();
        let selected: String = text.chars().skip(start).take(end - start).collect();
        let after: String = text.chars().skip(end).collect();

        let wrapper = self.create_element(tag);
        for (k, v) in attrs {
            self.set_attribute(wrapper, k, v.as_str());
        }
        let inner = self.create_text(selected);
        self.append_child(wrapper, inner);

        let reference = self.next_sibling(node);
        self.remove(node);
        if !before.is_empty() {
            let before = self.create_text(before);
            self.insert_before(parent, before, reference);
        }
        self.insert_before(parent, wrapper, reference);
        if !after.is_empty() {
            let after = self.create_text(after);
            self.insert_before(parent, after, reference);
        }

        self.set_selection(Some(Selection::within(inner, 0, end - start)));
        Ok(wrapper)
    }

    /// Applies a rich-text formatting command to the current selection.
    ///
    /// Returns `false` when the command is unknown or the selection cannot be
    /// formatted.
    pub fn exec_command(&mut self, command: &str, arg: Option<&str>) -> bool {
        let (tag, attrs) = match command {
            "bold" => ("b", Vec::new()),
            "italic" => ("i", Vec::new()),
            "underline" => ("u", Vec::new()),
            "strikeThrough" => ("s", Vec::new()),
            "createLink" => match arg {
                Some(href) => ("a", vec![("href".to_string(), href.to_string())]),
                None => {
                    tracing::warn!(command, "createLink requires a url argument");
                    return false;
                }
            },
            _ => {
                tracing::warn!(command, "unsupported formatting command");
                return false;
            }
        };

        match self.surround_selection(tag, &attrs) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(command, %err, "formatting command skipped");
                false
            }
        }
    }
}
