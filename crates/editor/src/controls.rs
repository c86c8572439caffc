use thingy_core::{EditableConfig, Operation, ResolvedTool, ToolAction, ToolEvent};
use thingy_dom::{DomEvent, EventKind, NodeId};
use tracing::{debug, warn};

use crate::error::EditorError;
use crate::listeners::ListenerAction;
use crate::session::EditorSession;
use crate::toolbar::NO_TOOLS_MESSAGE;

pub const LINK_TESTER_ID: &str = "te-link-tester";

/// A rendered toolbar control and the configuration its operations are
/// emitted with.
#[derive(Debug, Clone)]
pub struct ActiveTool {
    pub resolved: ResolvedTool,
    pub control: NodeId,
    pub config: EditableConfig,
}

impl EditorSession {
    /// Tools rendered for the most recently focused element.
    pub fn active_tools(&self) -> &[ActiveTool] {
        &self.active_tools
    }

    /// Rebuilds the toolbar for `focused` inside `region`.
    pub(crate) fn display_tools(&mut self, focused: NodeId, region: NodeId) -> Result<(), EditorError> {
        let toolbar = self.ensure_toolbar()?;
        let Some(region_config) = self.registration(region).map(|r| r.config.clone()) else {
            warn!(%region, "focused element belongs to an unregistered region");
            return Ok(());
        };

        let resolved = self.tools.resolve(
            &self.document,
            focused,
            region,
            region_config.tool_operates_on_element.as_ref(),
        );

        self.document.remove_children(toolbar.tools);
        self.active_tools.clear();

        if resolved.is_empty() {
            let placeholder = self.document.create_element("p");
            self.document.add_class(placeholder, "te-no-tools");
            self.document.set_inner_text(placeholder, NO_TOOLS_MESSAGE);
            self.document.append_child(toolbar.tools, placeholder);
        }
        for (index, tool) in resolved.into_iter().enumerate() {
            let config = self
                .registration(tool.controlled)
                .or_else(|| self.registration(focused))
                .map(|r| r.config.clone())
                .unwrap_or_else(|| region_config.clone());
            let control = self.render_tool(index, &tool, &config);
            self.document.append_child(toolbar.tools, control);
            self.active_tools.push(ActiveTool {
                resolved: tool,
                control,
                config,
            });
        }
        self.listeners.prune(&self.document);

        self.update_breadcrumb(toolbar, focused, &region_config);
        debug!(%focused, tools = self.active_tools.len(), "displayed tools");
        Ok(())
    }

    fn render_tool(&mut self, index: usize, resolved: &ResolvedTool, config: &EditableConfig) -> NodeId {
        let tool = &resolved.tool;
        let controlled = resolved.controlled;
        let doc = &mut self.document;

        let tag = tool.control_tag().to_string();
        let control = doc.create_element(&tag);
        doc.add_class(control, &format!("te-tool--{}", tool.kind_name()));
        if tag == "button" {
            doc.add_class(control, "te-btn");
        }

        match &tool.action {
            ToolAction::Command { .. } | ToolAction::SurroundsWith(_) => {
                if let Some(caption) = tool.caption() {
                    doc.set_inner_text(control, caption);
                }
            }
            ToolAction::Input => {
                if let Some(label) = &tool.label {
                    doc.set_attribute(control, "placeholder", label.as_str());
                }
                if let Some(value) = doc.property(controlled, &tool.controls) {
                    doc.set_attribute(control, "value", value);
                }
            }
            ToolAction::LinkPreview { links_to } => {
                let href = doc.property(controlled, links_to).unwrap_or_default();
                doc.set_attribute(control, "id", LINK_TESTER_ID);
                doc.set_attribute(control, "href", href);
                doc.set_attribute(control, "target", "_blank");
                if let Some(caption) = tool.caption() {
                    doc.set_inner_text(control, caption);
                }
            }
            ToolAction::ImagePicker => {
                for (image_index, image) in config.image_library.iter().enumerate() {
                    let img = doc.create_element("img");
                    doc.set_attribute(img, "src", image.src.as_str());
                    doc.set_attribute(img, "srcset", image.srcset.as_str());
                    doc.set_attribute(img, "title", image.title.as_str());
                    doc.set_attribute(img, "alt", image.alt.as_str());
                    doc.append_child(control, img);
                    self.listeners.add(
                        img,
                        EventKind::Click,
                        ListenerAction::PickImage {
                            tool: index,
                            image: image_index,
                        },
                    );
                }
            }
        }

        if let Some(tooltip) = &tool.tooltip {
            self.document.set_attribute(control, "title", tooltip.as_str());
        }
        if matches!(
            tool.action,
            ToolAction::Command { .. } | ToolAction::SurroundsWith(_) | ToolAction::Input
        ) {
            self.listeners
                .add(control, tool.on, ListenerAction::Tool { index });
        }
        control
    }

    /// Turns an interaction with the active tool at `index` into an
    /// operation and emits it for the tool's controlled element.
    pub(crate) fn run_tool(&mut self, index: usize, event: &DomEvent) -> Result<(), EditorError> {
        let Some(active) = self.active_tools.get(index).cloned() else {
            warn!(index, "no active tool at index");
            return Ok(());
        };
        let controlled = active.resolved.controlled;

        let operation = match &active.resolved.tool.action {
            ToolAction::Command { command, arg } => Operation::format(command.clone(), arg.clone()),
            ToolAction::SurroundsWith(spec) => {
                match self
                    .document
                    .surround_selection(&spec.element, &spec.attr_pairs())
                {
                    Ok(_) => Operation::text(self.document.inner_text(controlled)),
                    Err(err) => {
                        warn!(%err, element = %spec.element, "cannot wrap the current selection");
                        return Ok(());
                    }
                }
            }
            ToolAction::Input => {
                let value = self
                    .document
                    .attribute(active.control, "value")
                    .unwrap_or_default()
                    .to_string();
                Operation::field(active.resolved.tool.controls.clone(), value)
            }
            ToolAction::ImagePicker | ToolAction::LinkPreview { .. } => return Ok(()),
        };

        let tool_event = ToolEvent::new(controlled, operation).dom_event(event.clone());
        self.emit(&tool_event, &active.config)
    }

    pub(crate) fn pick_image(
        &mut self,
        tool: usize,
        image: usize,
        event: &DomEvent,
    ) -> Result<(), EditorError> {
        let Some(active) = self.active_tools.get(tool).cloned() else {
            return Ok(());
        };
        let Some(asset) = active.config.image_library.get(image) else {
            warn!(image, "image library has no entry at index");
            return Ok(());
        };
        let operation = Operation::fields([
            ("src", asset.src.clone()),
            ("srcset", asset.srcset.clone()),
            ("title", asset.title.clone()),
            ("alt", asset.alt.clone()),
        ]);
        let tool_event =
            ToolEvent::new(active.resolved.controlled, operation).dom_event(event.clone());
        self.emit(&tool_event, &active.config)
    }
}
