mod backend;
mod config;
mod error;
mod ops;
mod store;
mod tools;

pub use crate::backend::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::ops::*;
pub use crate::store::*;
pub use crate::tools::*;
