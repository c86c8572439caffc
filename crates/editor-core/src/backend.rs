use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use thingy_dom::{Document, NodeId};
use tracing::{debug, error, warn};

use crate::config::{DOM_BACKEND_ID, EditableConfig, LOCAL_STORAGE_BACKEND_ID};
use crate::error::{BackendError, ConfigError, DispatchError};
use crate::ops::{Operation, ToolEvent};
use crate::store::{PathStore, parse_path};

/// A sink that applies operations to the document, to storage, or both.
pub trait Backend {
    fn id(&self) -> &str;

    fn apply(
        &self,
        document: &mut Document,
        element: NodeId,
        operation: &Operation,
        config: &EditableConfig,
    ) -> Result<(), BackendError>;
}

/// Writes operations straight into the live document.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomBackend;

impl Backend for DomBackend {
    fn id(&self) -> &str {
        DOM_BACKEND_ID
    }

    fn apply(
        &self,
        document: &mut Document,
        element: NodeId,
        operation: &Operation,
        config: &EditableConfig,
    ) -> Result<(), BackendError> {
        match operation {
            Operation::FieldUpdate { fields } => {
                for (field, value) in fields {
                    let value = property_value(value);
                    if let Err(err) = document.set_property(element, field, &value) {
                        warn!(%element, %field, %err, "could not apply field to element");
                    }
                }
            }
            // Direct text edits already happened in place.
            Operation::TextReplace { .. } => {}
            Operation::FormatCommand { command, arg } => {
                document.exec_command(command, arg.as_deref());
            }
            Operation::Composite { ops } => {
                for op in ops {
                    self.apply(document, element, op, config)?;
                }
            }
        }
        Ok(())
    }
}

fn property_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Merges operations into the document stored under the configured
/// `topLevelKey`, at the path carried by the element's path attribute.
#[derive(Debug, Clone)]
pub struct StoreBackend {
    store: PathStore,
}

impl StoreBackend {
    pub fn new(store: PathStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &PathStore {
        &self.store
    }
}

impl Backend for StoreBackend {
    fn id(&self) -> &str {
        LOCAL_STORAGE_BACKEND_ID
    }

    fn apply(
        &self,
        document: &mut Document,
        element: NodeId,
        operation: &Operation,
        config: &EditableConfig,
    ) -> Result<(), BackendError> {
        let key = config.top_level_key()?;
        let Some(raw_path) = document.attribute(element, &config.path_attribute) else {
            return Err(BackendError::MissingAttribute {
                element,
                attribute: config.path_attribute.clone(),
            });
        };
        let path = parse_path(raw_path);

        match operation {
            Operation::FieldUpdate { fields } => {
                self.store
                    .update(key, &path, Value::Object(fields.clone()))?;
            }
            Operation::TextReplace { text } => {
                self.store.update(key, &path, Value::String(text.clone()))?;
            }
            Operation::FormatCommand { command, .. } => {
                debug!(%element, %command, "format commands are not persisted");
            }
            Operation::Composite { ops } => {
                for op in ops {
                    self.apply(document, element, op, config)?;
                }
            }
        }
        Ok(())
    }
}

/// Backends keyed by id, in registration order.
#[derive(Default)]
pub struct BackendRegistry {
    backends: IndexMap<String, Box<dyn Backend>>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.backends.keys()).finish()
    }
}

impl BackendRegistry {
    pub fn new(
        backends: impl IntoIterator<Item = Box<dyn Backend>>,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        for backend in backends {
            registry.register(backend)?;
        }
        Ok(registry)
    }

    /// The DOM backend plus a store backend over `store`.
    pub fn with_store(store: PathStore) -> Self {
        let backends: Vec<Box<dyn Backend>> =
            vec![Box::new(DomBackend), Box::new(StoreBackend::new(store))];
        Self::new(backends).expect("builtin backends must have distinct ids")
    }

    pub fn register(&mut self, backend: Box<dyn Backend>) -> Result<(), ConfigError> {
        let id = backend.id().to_string();
        if self.backends.contains_key(&id) {
            return Err(ConfigError::DuplicateBackend(id));
        }
        self.backends.insert(id, backend);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Backend> {
        self.backends.get(id).map(|b| b.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.backends.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

/// Hands `event` to every backend listed in `config`, in order.
///
/// Unknown backends and elements without a path attribute are logged and
/// skipped so the remaining backends still run. Configuration and storage
/// failures abort the dispatch.
pub fn emit(
    document: &mut Document,
    registry: &BackendRegistry,
    event: &ToolEvent,
    config: &EditableConfig,
) -> Result<(), DispatchError> {
    if config.backends.is_empty() {
        error!(selector = %config.selector, "no backends configured; dropping operation");
        return Ok(());
    }

    for id in &config.backends {
        let Some(backend) = registry.get(id) else {
            error!(backend = %id, element = %event.element, "backend is not registered; skipping");
            continue;
        };
        match backend.apply(document, event.element, &event.operation, config) {
            Ok(()) => {}
            Err(BackendError::MissingAttribute { element, attribute }) => {
                warn!(
                    backend = %id,
                    %element,
                    %attribute,
                    "element has no path attribute; edit not persisted"
                );
            }
            Err(BackendError::Config(err)) => return Err(err.into()),
            Err(BackendError::Store(err)) => return Err(err.into()),
        }
    }
    Ok(())
}
