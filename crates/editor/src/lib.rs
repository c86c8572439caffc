//! Editable regions on top of a [`thingy_dom::Document`].
//!
//! An [`EditorSession`] owns the document, the registry of editable
//! elements, the listener table and the toolbar. Hosts feed it DOM events
//! through [`EditorSession::dispatch`] (or the focus/click/key helpers) and
//! read the resulting markup and persisted documents back.

mod controls;
mod error;
mod listeners;
mod proximity;
mod session;
mod toolbar;

pub use crate::controls::*;
pub use crate::error::*;
pub use crate::listeners::*;
pub use crate::proximity::*;
pub use crate::session::*;
pub use crate::toolbar::*;
