use thingy_core::{ConfigError, DispatchError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
