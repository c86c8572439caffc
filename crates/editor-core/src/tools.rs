use std::collections::BTreeMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thingy_dom::{Document, EventKind, NodeId, SelectorList};

use crate::error::ConfigError;
use crate::ops::INNER_TEXT;

/// Inline element that a `surroundsWith` tool wraps the selection in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurroundSpec {
    pub element: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl SurroundSpec {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn attr_pairs(&self) -> Vec<(String, String)> {
        self.attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    /// Runs a formatting command against the current selection.
    Command { command: String, arg: Option<String> },
    /// Wraps the selected text in a new inline element.
    SurroundsWith(SurroundSpec),
    /// Text input bound to the `controls` field.
    Input,
    /// Grid of images from the region's image library.
    ImagePicker,
    /// Anchor pointing at the controlled element's `links_to` property.
    LinkPreview { links_to: String },
}

/// A declarative toolbar control bound to one editing capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawToolDefinition", into = "RawToolDefinition")]
pub struct ToolDefinition {
    pub text: Option<String>,
    pub label: Option<String>,
    pub tooltip: Option<String>,
    /// Operation field the tool produces, e.g. `href` or `innerText`.
    pub controls: String,
    /// UI event that triggers the tool.
    pub on: EventKind,
    pub tag_name: Option<String>,
    pub action: ToolAction,
}

impl ToolDefinition {
    fn with_action(action: ToolAction) -> Self {
        Self {
            text: None,
            label: None,
            tooltip: None,
            controls: INNER_TEXT.to_string(),
            on: EventKind::Click,
            tag_name: None,
            action,
        }
    }

    pub fn command(text: impl Into<String>, command: impl Into<String>) -> Self {
        Self::with_action(ToolAction::Command {
            command: command.into(),
            arg: None,
        })
        .text(text)
        .controls("selection")
    }

    pub fn surround(text: impl Into<String>, spec: SurroundSpec) -> Self {
        Self::with_action(ToolAction::SurroundsWith(spec))
            .text(text)
            .controls("selection")
    }

    pub fn input(label: impl Into<String>, controls: impl Into<String>) -> Self {
        Self::with_action(ToolAction::Input)
            .label(label)
            .controls(controls)
    }

    pub fn image_picker(text: impl Into<String>) -> Self {
        Self::with_action(ToolAction::ImagePicker).text(text)
    }

    pub fn link_preview(text: impl Into<String>, links_to: impl Into<String>) -> Self {
        Self::with_action(ToolAction::LinkPreview {
            links_to: links_to.into(),
        })
        .text(text)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn controls(mut self, controls: impl Into<String>) -> Self {
        self.controls = controls.into();
        self
    }

    pub fn on(mut self, on: EventKind) -> Self {
        self.on = on;
        self
    }

    pub fn tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = Some(tag_name.into());
        self
    }

    pub fn command_arg(mut self, value: impl Into<String>) -> Self {
        if let ToolAction::Command { arg, .. } = &mut self.action {
            *arg = Some(value.into());
        }
        self
    }

    /// Tag of the control rendered for this tool.
    pub fn control_tag(&self) -> &str {
        if let Some(tag) = &self.tag_name {
            return tag;
        }
        match self.action {
            ToolAction::Input => "input",
            ToolAction::ImagePicker => "div",
            ToolAction::LinkPreview { .. } => "a",
            ToolAction::Command { .. } | ToolAction::SurroundsWith(_) => "button",
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.action {
            ToolAction::Command { .. } => "command",
            ToolAction::SurroundsWith(_) => "surround",
            ToolAction::Input => "text",
            ToolAction::ImagePicker => "image",
            ToolAction::LinkPreview { .. } => "link",
        }
    }

    /// Visible caption: `text`, falling back to `label`.
    pub fn caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.label.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawToolDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    controls: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on: Option<EventKind>,
    #[serde(alias = "tag", skip_serializing_if = "Option::is_none")]
    tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_arg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    surrounds_with: Option<SurroundSpec>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    links_to: Option<String>,
}

impl TryFrom<RawToolDefinition> for ToolDefinition {
    type Error = ConfigError;

    fn try_from(raw: RawToolDefinition) -> Result<Self, Self::Error> {
        let name = raw
            .text
            .clone()
            .or_else(|| raw.label.clone())
            .unwrap_or_else(|| "<unnamed>".to_string());
        let invalid = |reason: String| ConfigError::InvalidTool {
            tool: name.clone(),
            reason,
        };

        let mut actions = Vec::new();
        if let Some(command) = raw.command {
            actions.push(ToolAction::Command {
                command,
                arg: raw.command_arg,
            });
        }
        if let Some(spec) = raw.surrounds_with {
            actions.push(ToolAction::SurroundsWith(spec));
        }
        match raw.kind.as_deref() {
            None => {}
            Some("text") => actions.push(ToolAction::Input),
            Some("image") => actions.push(ToolAction::ImagePicker),
            Some("link") => actions.push(ToolAction::LinkPreview {
                links_to: raw.links_to.unwrap_or_else(|| "href".to_string()),
            }),
            Some(other) => return Err(invalid(format!("unknown type `{other}`"))),
        }

        let action = match actions.len() {
            1 => actions.remove(0),
            0 => {
                return Err(invalid(
                    "expected one of command, surroundsWith or type".to_string(),
                ));
            }
            _ => {
                return Err(invalid(
                    "command, surroundsWith and type are mutually exclusive".to_string(),
                ));
            }
        };

        Ok(ToolDefinition {
            text: raw.text,
            label: raw.label,
            tooltip: raw.tooltip,
            controls: raw.controls.unwrap_or_else(|| INNER_TEXT.to_string()),
            on: raw.on.unwrap_or_default(),
            tag_name: raw.tag_name,
            action,
        })
    }
}

impl From<ToolDefinition> for RawToolDefinition {
    fn from(tool: ToolDefinition) -> Self {
        let mut raw = RawToolDefinition {
            text: tool.text,
            label: tool.label,
            tooltip: tool.tooltip,
            controls: Some(tool.controls),
            on: Some(tool.on),
            tag_name: tool.tag_name,
            ..Default::default()
        };
        match tool.action {
            ToolAction::Command { command, arg } => {
                raw.command = Some(command);
                raw.command_arg = arg;
            }
            ToolAction::SurroundsWith(spec) => raw.surrounds_with = Some(spec),
            ToolAction::Input => raw.kind = Some("text".to_string()),
            ToolAction::ImagePicker => raw.kind = Some("image".to_string()),
            ToolAction::LinkPreview { links_to } => {
                raw.kind = Some("link".to_string());
                raw.links_to = Some(links_to);
            }
        }
        raw
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolGroup {
    pub selector: SelectorList,
    pub tools: Vec<ToolDefinition>,
}

/// Selector-keyed tool lists, kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, Vec<ToolDefinition>>",
    into = "IndexMap<String, Vec<ToolDefinition>>"
)]
pub struct ToolTable {
    groups: Vec<ToolGroup>,
}

impl ToolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tools available to every editor: text formatting for paragraphs and
    /// blocks, link editing, and image picking.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table
            .insert(
                "p,div",
                vec![
                    ToolDefinition::command("B", "bold").tooltip("Bold"),
                    ToolDefinition::command("I", "italic").tooltip("Italicize"),
                    ToolDefinition::command("U", "underline").tooltip("Underline"),
                ],
            )
            .expect("builtin selectors must parse");
        table
            .insert(
                "a",
                vec![
                    ToolDefinition::input("Link href", "href").on(EventKind::KeyUp),
                    ToolDefinition::input("Link text", INNER_TEXT).on(EventKind::KeyUp),
                    ToolDefinition::link_preview("\u{27a1}\u{fe0f}", "href").tooltip("Open link"),
                ],
            )
            .expect("builtin selectors must parse");
        table
            .insert("img", vec![ToolDefinition::image_picker("Choose image")])
            .expect("builtin selectors must parse");
        table
    }

    /// Appends `tools` under `selector`, extending an existing entry with the
    /// same selector text.
    pub fn insert(
        &mut self,
        selector: &str,
        tools: Vec<ToolDefinition>,
    ) -> Result<(), ConfigError> {
        let selector = SelectorList::parse(selector)?;
        match self
            .groups
            .iter_mut()
            .find(|g| g.selector.as_str() == selector.as_str())
        {
            Some(group) => group.tools.extend(tools),
            None => self.groups.push(ToolGroup { selector, tools }),
        }
        Ok(())
    }

    pub fn extend(&mut self, other: ToolTable) {
        for group in other.groups {
            match self
                .groups
                .iter_mut()
                .find(|g| g.selector.as_str() == group.selector.as_str())
            {
                Some(existing) => existing.tools.extend(group.tools),
                None => self.groups.push(group),
            }
        }
    }

    pub fn groups(&self) -> &[ToolGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Tools applicable to `active` inside `region`, concatenated in table
    /// order. Duplicates across matching selectors are kept.
    pub fn resolve(
        &self,
        doc: &Document,
        active: NodeId,
        region: NodeId,
        filter: Option<&ToolFilter>,
    ) -> Vec<ResolvedTool> {
        let active = element_or_parent(doc, active);
        let mut resolved = Vec::new();
        for group in &self.groups {
            let matched = matching_element(doc, active, region, &group.selector);
            let candidate = ToolMatch {
                selector: &group.selector,
                tools: &group.tools,
                element: active,
                matched,
            };
            let applicable = match filter {
                Some(filter) => filter(doc, &candidate),
                None => matched.is_some(),
            };
            if !applicable {
                continue;
            }
            let controlled = matched.unwrap_or(active);
            resolved.extend(group.tools.iter().map(|tool| ResolvedTool {
                selector: group.selector.as_str().to_string(),
                tool: tool.clone(),
                controlled,
            }));
        }
        resolved
    }
}

impl TryFrom<IndexMap<String, Vec<ToolDefinition>>> for ToolTable {
    type Error = ConfigError;

    fn try_from(entries: IndexMap<String, Vec<ToolDefinition>>) -> Result<Self, Self::Error> {
        let mut table = Self::new();
        for (selector, tools) in entries {
            table.insert(&selector, tools)?;
        }
        Ok(table)
    }
}

impl From<ToolTable> for IndexMap<String, Vec<ToolDefinition>> {
    fn from(table: ToolTable) -> Self {
        table
            .groups
            .into_iter()
            .map(|g| (g.selector.as_str().to_string(), g.tools))
            .collect()
    }
}

/// A tool applicable to the focused element, and the element it edits.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTool {
    pub selector: String,
    pub tool: ToolDefinition,
    pub controlled: NodeId,
}

/// Candidate passed to a [`ToolFilter`].
#[derive(Debug)]
pub struct ToolMatch<'a> {
    pub selector: &'a SelectorList,
    pub tools: &'a [ToolDefinition],
    /// The focused element.
    pub element: NodeId,
    /// The element the selector matched, if any.
    pub matched: Option<NodeId>,
}

/// Overrides selector applicability during tool resolution.
pub type ToolFilter = Rc<dyn Fn(&Document, &ToolMatch<'_>) -> bool>;

/// `active`, or the region as a fallback, whichever matches `selector` first.
pub fn matching_element(
    doc: &Document,
    active: NodeId,
    region: NodeId,
    selector: &SelectorList,
) -> Option<NodeId> {
    if doc.matches(active, selector) {
        Some(active)
    } else if doc.matches(region, selector) {
        Some(region)
    } else {
        None
    }
}

fn element_or_parent(doc: &Document, node: NodeId) -> NodeId {
    if doc.is_element(node) {
        node
    } else {
        doc.parent_element(node).unwrap_or(node)
    }
}
