use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{DecodeError, StorageError, StoreError};
use crate::ops::INNER_TEXT;

/// Synchronous string key-value medium, shaped like the browser's
/// `localStorage`.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str);
}

/// In-memory storage. Clones share the same underlying items.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<BTreeMap<String, String>>>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would grow the total of key and value bytes past
    /// `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Rejects every write.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn used_bytes(&self) -> usize {
        self.items
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Disabled);
        }
        if let Some(quota) = self.quota {
            let current = self.items.borrow().get(key).map_or(0, |v| key.len() + v.len());
            let needed = self.used_bytes() - current + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

/// One step of a path into a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Canonical decimal numbers become indices. Anything else, including
    /// `01` or `+1`, stays a key so its text survives folding.
    pub fn parse(segment: &str) -> Self {
        let canonical = segment == "0" || !segment.starts_with('0');
        match array_index(segment) {
            Some(ix) if canonical => Self::Index(ix),
            _ => Self::Key(segment.to_string()),
        }
    }

    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Self::Key(key) => Cow::Borrowed(key),
            Self::Index(ix) => Cow::Owned(ix.to_string()),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<&str> for PathSegment {
    fn from(segment: &str) -> Self {
        Self::parse(segment)
    }
}

impl From<String> for PathSegment {
    fn from(segment: String) -> Self {
        Self::parse(&segment)
    }
}

impl From<usize> for PathSegment {
    fn from(ix: usize) -> Self {
        Self::Index(ix)
    }
}

/// Splits a path attribute such as `projects 0 link` or `projects.0.link`.
pub fn parse_path(raw: &str) -> Vec<PathSegment> {
    raw.split(|c: char| c.is_whitespace() || c == '.')
        .filter(|s| !s.is_empty())
        .map(PathSegment::parse)
        .collect()
}

/// A bare string update stands for `{"innerText": string}`.
pub fn coerce_operation(value: Value) -> Value {
    match value {
        Value::String(text) => {
            let mut fields = Map::new();
            fields.insert(INNER_TEXT.to_string(), Value::String(text));
            Value::Object(fields)
        }
        other => other,
    }
}

/// Wraps `value` in one single-key object per segment, innermost first.
pub fn fold_path(path: &[PathSegment], value: Value) -> Value {
    path.iter().rev().fold(value, |inner, segment| {
        let mut wrapper = Map::new();
        wrapper.insert(segment.as_key().into_owned(), inner);
        Value::Object(wrapper)
    })
}

/// Merges `source` into `target` without dropping unrelated keys.
///
/// Recursion happens through objects only. An object merged into an array
/// addresses elements by numeric key; arrays and scalars in `source` replace
/// whatever `target` held.
pub fn deep_merge(target: &mut Value, source: Value) {
    let incoming = match source {
        Value::Object(incoming) => incoming,
        other => {
            *target = other;
            return;
        }
    };
    match target {
        Value::Object(existing) => {
            for (key, value) in incoming {
                if let Some(slot) = existing.get_mut(&key) {
                    deep_merge(slot, value);
                } else {
                    existing.insert(key, value);
                }
            }
        }
        Value::Array(items) => merge_into_array(items, incoming),
        _ => *target = Value::Object(incoming),
    }
}

/// Largest run of `null` padding an index merge may append to an array.
const MAX_ARRAY_GAP: usize = 1024;

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

fn merge_into_array(items: &mut Vec<Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        let Some(ix) = array_index(&key) else {
            tracing::warn!(%key, "dropping non-index key merged into an array");
            continue;
        };
        if ix >= items.len() {
            let padded = ix
                .checked_add(1)
                .filter(|&len| len - items.len() <= MAX_ARRAY_GAP);
            let Some(len) = padded else {
                tracing::warn!(
                    index = ix,
                    len = items.len(),
                    "dropping out-of-range index merged into an array"
                );
                continue;
            };
            items.resize(len, Value::Null);
        }
        deep_merge(&mut items[ix], value);
    }
}

/// JSON documents persisted under top-level keys of a [`KeyValueStorage`].
#[derive(Clone)]
pub struct PathStore {
    storage: Rc<dyn KeyValueStorage>,
}

impl fmt::Debug for PathStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathStore").finish_non_exhaustive()
    }
}

impl PathStore {
    pub fn new(storage: impl KeyValueStorage + 'static) -> Self {
        Self {
            storage: Rc::new(storage),
        }
    }

    pub fn from_shared(storage: Rc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn try_get(&self, key: &str) -> Result<Option<Value>, DecodeError> {
        let Some(raw) = self.storage.get_item(key) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| DecodeError {
                key: key.to_string(),
                source,
            })
    }

    /// Like [`PathStore::try_get`], but corrupt data reads as absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.try_get(key).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring corrupt stored document");
            None
        })
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    pub fn save(&self, key: &str, document: &Value) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(document).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.storage.set_item(key, &encoded)?;
        Ok(())
    }

    /// Merges `operation` at `path` into the document under `key`, persists
    /// the result and returns it.
    pub fn update(
        &self,
        key: &str,
        path: &[PathSegment],
        operation: Value,
    ) -> Result<Value, StoreError> {
        let incoming = fold_path(path, coerce_operation(operation));
        let mut document = match self.get(key) {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(existing) => existing,
        };
        deep_merge(&mut document, incoming);
        self.save(key, &document)?;
        tracing::debug!(key, path = %display_path(path), "merged update into stored document");
        Ok(document)
    }
}

pub fn display_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(|s| s.as_key())
        .collect::<Vec<_>>()
        .join(" ")
}
