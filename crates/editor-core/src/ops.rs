use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thingy_dom::{DomEvent, NodeId};

pub type FieldMap = Map<String, Value>;

/// Field that a bare text operation stands for.
pub const INNER_TEXT: &str = "innerText";

/// Generic payload produced by a tool interaction and consumed by backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Keyed partial update, e.g. `{"href": "https://..."}`.
    FieldUpdate { fields: FieldMap },
    /// The element's text was edited in place.
    TextReplace { text: String },
    /// Rich-text formatting command applied to the current selection.
    FormatCommand {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arg: Option<String>,
    },
    Composite { ops: Vec<Operation> },
}

impl Operation {
    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = FieldMap::new();
        fields.insert(name.into(), value.into());
        Self::FieldUpdate { fields }
    }

    pub fn fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::FieldUpdate {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::TextReplace { text: text.into() }
    }

    pub fn format(command: impl Into<String>, arg: Option<String>) -> Self {
        Self::FormatCommand {
            command: command.into(),
            arg,
        }
    }

    /// Sequences two operations, flattening nested composites.
    pub fn then(self, next: Operation) -> Self {
        let mut ops = match self {
            Self::Composite { ops } => ops,
            other => vec![other],
        };
        match next {
            Self::Composite { ops: more } => ops.extend(more),
            other => ops.push(other),
        }
        Self::Composite { ops }
    }
}

impl From<String> for Operation {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for Operation {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

/// An operation together with the element it targets and the UI event that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolEvent {
    pub element: NodeId,
    pub operation: Operation,
    pub dom_event: Option<DomEvent>,
}

impl ToolEvent {
    pub fn new(element: NodeId, operation: Operation) -> Self {
        Self {
            element,
            operation,
            dom_event: None,
        }
    }

    pub fn dom_event(mut self, dom_event: DomEvent) -> Self {
        self.dom_event = Some(dom_event);
        self
    }
}
