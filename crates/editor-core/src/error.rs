use thingy_dom::{NodeId, SelectorError};
use thiserror::Error;

/// The key-value medium refused a write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing `{key}` ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    #[error("storage is disabled")]
    Disabled,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to encode document for `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Stored value is present but is not valid JSON.
#[derive(Debug, Error)]
#[error("corrupt document under `{key}`: {source}")]
pub struct DecodeError {
    pub key: String,
    #[source]
    pub source: serde_json::Error,
}

/// Integrator misuse. These are surfaced to the caller rather than logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("localStorage backend expects a localStorageBackend.topLevelKey key in config")]
    MissingTopLevelKey,
    #[error("no backends configured for `{selector}`")]
    NoBackends { selector: String },
    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),
    #[error("invalid tool `{tool}`: {reason}")]
    InvalidTool { tool: String, reason: String },
    #[error("toolbar mount point `{selector}` matches no element")]
    UnknownMountPoint { selector: String },
    #[error("duplicate backend id: {0}")]
    DuplicateBackend(String),
}

/// Failure of a single backend while applying an operation.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{element} has no `{attribute}` attribute")]
    MissingAttribute { element: NodeId, attribute: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure that aborts a dispatch. Recoverable per-backend problems are
/// logged instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
