use thingy_dom::{EventKind, NodeId, Rect};
use tracing::debug;

use crate::error::EditorError;
use crate::listeners::{AffordanceKind, ListenerAction};
use crate::session::EditorSession;

/// Size of the "+" and "−" controls; they appear once the pointer is
/// within this distance past the outline margin.
pub const AFFORDANCE_SIZE: f32 = 52.0;
pub const AFFORDANCE_CLASS: &str = "te-affordance";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub minus: NodeId,
    pub plus: NodeId,
}

fn is_near(rect: Rect, x: f32, y: f32, margin: f32) -> bool {
    !rect.is_empty() && rect.contains_with_margin(x, y, margin)
}

impl EditorSession {
    pub fn affordances(&self, element: NodeId) -> Option<Affordances> {
        self.affordances.get(&element).copied()
    }

    /// Outlines every registered element near the pointer and toggles the
    /// affordances of repeatable ones.
    pub(crate) fn update_proximity(&mut self, (x, y): (f32, f32)) -> Result<(), EditorError> {
        let entries: Vec<(NodeId, f32, bool)> = self
            .registrations
            .iter()
            .map(|r| (r.element, r.config.proximity_margin, r.config.repeatable))
            .collect();

        for (element, margin, repeatable) in entries {
            if !self.document.is_connected(element) {
                continue;
            }
            let rect = self.document.rect(element);
            if is_near(rect, x, y, margin) {
                self.document
                    .set_style(element, "outline", format!("{margin}px solid red"));
            } else {
                self.document.set_style(element, "outline", "initial");
            }

            if repeatable {
                let nearby = is_near(rect, x, y, margin + AFFORDANCE_SIZE);
                let shown = self.affordances.contains_key(&element);
                if nearby && !shown {
                    self.show_affordances(element, margin)?;
                } else if !nearby && shown {
                    self.hide_affordances(element);
                }
            }
        }
        Ok(())
    }

    fn show_affordances(&mut self, element: NodeId, margin: f32) -> Result<(), EditorError> {
        let mount = self.mount_point()?;
        let rect = self.document.rect(element);
        let left = rect.right() + margin;

        let minus = self.create_affordance("\u{2212}", left, rect.top);
        let plus = self.create_affordance("+", left, rect.bottom() - AFFORDANCE_SIZE);
        self.document.append_child(mount, minus);
        self.document.append_child(mount, plus);

        self.listeners.add(
            minus,
            EventKind::Click,
            ListenerAction::Affordance {
                element,
                kind: AffordanceKind::Minus,
            },
        );
        self.listeners.add(
            plus,
            EventKind::Click,
            ListenerAction::Affordance {
                element,
                kind: AffordanceKind::Plus,
            },
        );
        self.affordances.insert(element, Affordances { minus, plus });
        Ok(())
    }

    fn create_affordance(&mut self, text: &str, left: f32, top: f32) -> NodeId {
        let doc = &mut self.document;
        let node = doc.create_element("div");
        doc.add_class(node, AFFORDANCE_CLASS);
        doc.set_inner_text(node, text);
        doc.set_style(node, "position", "fixed");
        doc.set_style(node, "top", format!("{top}px"));
        doc.set_style(node, "left", format!("{left}px"));
        doc.set_style(node, "color", "red");
        doc.set_style(node, "font-weight", "bold");
        doc.set_style(node, "font-size", format!("{AFFORDANCE_SIZE}px"));
        doc.set_style(node, "cursor", "pointer");
        doc.set_rect(node, Rect::new(left, top, AFFORDANCE_SIZE / 2.0, AFFORDANCE_SIZE));
        node
    }

    pub(crate) fn hide_affordances(&mut self, element: NodeId) {
        let Some(affordances) = self.affordances.shift_remove(&element) else {
            return;
        };
        self.document.remove(affordances.minus);
        self.document.remove(affordances.plus);
        self.listeners.prune(&self.document);
    }

    pub(crate) fn on_affordance(
        &mut self,
        element: NodeId,
        kind: AffordanceKind,
    ) -> Result<(), EditorError> {
        match kind {
            AffordanceKind::Minus => {
                self.hide_affordances(element);
                self.document.remove(element);
                self.unregister(element);
                debug!(%element, "removed editable");
            }
            AffordanceKind::Plus => {
                let Some(config) = self.registration(element).map(|r| r.config.clone()) else {
                    return Ok(());
                };
                if let Some(clone) = self.clone_editable(element, &config) {
                    self.make_editable(clone, &config)?;
                    self.disable_links(clone);
                }
            }
        }
        Ok(())
    }

    /// Focuses the deepest registered element near the pointer. Clicks on
    /// the toolbar or on affordances are ignored.
    pub(crate) fn focus_nearest(&mut self, (x, y): (f32, f32), target: NodeId) -> Result<(), EditorError> {
        if self.is_editor_chrome(target) {
            return Ok(());
        }
        let nearest = self
            .registrations
            .iter()
            .filter(|r| self.document.is_connected(r.element))
            .filter(|r| {
                is_near(
                    self.document.rect(r.element),
                    x,
                    y,
                    r.config.proximity_margin,
                )
            })
            .max_by_key(|r| self.document.depth(r.element))
            .map(|r| r.element);

        if let Some(element) = nearest {
            if self.document.active_element() != Some(element) {
                self.focus(element)?;
            }
        }
        Ok(())
    }
}
