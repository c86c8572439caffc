use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::NodeId;

pub const ENTER_KEY: &str = "Enter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Focus,
    Blur,
    #[default]
    Click,
    Input,
    Change,
    KeyDown,
    KeyUp,
    KeyPress,
    MouseDown,
    MouseMove,
    MouseUp,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Click => "click",
            Self::Input => "input",
            Self::Change => "change",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::KeyPress => "keypress",
            Self::MouseDown => "mousedown",
            Self::MouseMove => "mousemove",
            Self::MouseUp => "mouseup",
        }
    }

    pub fn bubbles(self) -> bool {
        !matches!(self, Self::Focus | Self::Blur)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind `{0}`")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "focus" => Self::Focus,
            "blur" => Self::Blur,
            "click" => Self::Click,
            "input" => Self::Input,
            "change" => Self::Change,
            "keydown" => Self::KeyDown,
            "keyup" => Self::KeyUp,
            "keypress" => Self::KeyPress,
            "mousedown" => Self::MouseDown,
            "mousemove" => Self::MouseMove,
            "mouseup" => Self::MouseUp,
            other => return Err(UnknownEventKind(other.to_string())),
        })
    }
}

/// A user-interface event aimed at `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: NodeId,
    pub key: Option<String>,
    pub ctrl_key: bool,
    /// Pointer position in client coordinates, for mouse events.
    pub pointer: Option<(f32, f32)>,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            key: None,
            ctrl_key: false,
            pointer: None,
        }
    }

    pub fn focus(target: NodeId) -> Self {
        Self::new(EventKind::Focus, target)
    }

    pub fn click(target: NodeId) -> Self {
        Self::new(EventKind::Click, target)
    }

    pub fn key_up(target: NodeId, key: impl Into<String>) -> Self {
        Self::new(EventKind::KeyUp, target).key(key)
    }

    pub fn key_press(target: NodeId, key: impl Into<String>) -> Self {
        Self::new(EventKind::KeyPress, target).key(key)
    }

    pub fn mouse(kind: EventKind, target: NodeId, x: f32, y: f32) -> Self {
        Self::new(kind, target).at(x, y)
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.pointer = Some((x, y));
        self
    }

    pub fn is_enter(&self) -> bool {
        self.key.as_deref() == Some(ENTER_KEY)
    }
}
