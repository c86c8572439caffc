//! In-memory document tree used by the editor.
//!
//! Covers the subset of the browser platform the editor relies on: node
//! creation and cloning, attribute and inline style access, a CSS selector
//! subset, text selections, formatting commands and event propagation paths.
//! Geometry is not computed; hosts assign bounding boxes with
//! [`Document::set_rect`].

mod document;
mod event;
mod html;
mod selection;
mod selector;

pub use crate::document::*;
pub use crate::event::*;
pub use crate::html::*;
pub use crate::selection::*;
pub use crate::selector::*;
