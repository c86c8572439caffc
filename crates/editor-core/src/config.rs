use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thingy_dom::Document;

use crate::error::ConfigError;
use crate::tools::{ToolDefinition, ToolFilter, ToolMatch, ToolTable};

pub const DOM_BACKEND_ID: &str = "dom";
pub const LOCAL_STORAGE_BACKEND_ID: &str = "localStorage";
pub const DEFAULT_PATH_ATTRIBUTE: &str = "data-thingy-path";
pub const DEFAULT_PROXIMITY_MARGIN: f32 = 16.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStorageBackendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_level_key: Option<String>,
}

/// One entry of an image library offered by the image picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAsset {
    pub src: String,
    pub srcset: String,
    pub title: String,
    pub alt: String,
}

impl ImageAsset {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Default::default()
        }
    }

    pub fn srcset(mut self, srcset: impl Into<String>) -> Self {
        self.srcset = srcset.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }
}

/// Options a region (or a nested selector) may override. Unset fields
/// inherit from the enclosing level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegionOptions {
    #[serde(alias = "cloneOnCtrlEnter", skip_serializing_if = "Option::is_none")]
    pub repeatable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_focused_element: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disallow_default_enter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_library: Option<Vec<ImageAsset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backends: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_storage_backend: Option<LocalStorageBackendConfig>,
}

impl RegionOptions {
    /// Field-wise override: every field set in `other` wins.
    pub fn overridden_by(&self, other: &RegionOptions) -> RegionOptions {
        RegionOptions {
            repeatable: other.repeatable.or(self.repeatable),
            clone_focused_element: other.clone_focused_element.or(self.clone_focused_element),
            disallow_default_enter: other
                .disallow_default_enter
                .or(self.disallow_default_enter),
            image_library: other
                .image_library
                .clone()
                .or_else(|| self.image_library.clone()),
            backends: other.backends.clone().or_else(|| self.backends.clone()),
            local_storage_backend: other
                .local_storage_backend
                .clone()
                .or_else(|| self.local_storage_backend.clone()),
        }
    }
}

/// A nested editable selector, either bare or with its own overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NestedSelector {
    Plain(String),
    Detailed {
        selector: String,
        #[serde(flatten)]
        options: RegionOptions,
    },
}

impl NestedSelector {
    pub fn selector(&self) -> &str {
        match self {
            Self::Plain(selector) | Self::Detailed { selector, .. } => selector,
        }
    }

    pub fn options(&self) -> Option<&RegionOptions> {
        match self {
            Self::Plain(_) => None,
            Self::Detailed { options, .. } => Some(options),
        }
    }
}

impl From<&str> for NestedSelector {
    fn from(selector: &str) -> Self {
        Self::Plain(selector.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDescriptor {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<NestedSelector>,
    #[serde(flatten)]
    pub options: RegionOptions,
}

impl RegionDescriptor {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            nested: Vec::new(),
            options: RegionOptions::default(),
        }
    }

    pub fn nested(mut self, selector: impl Into<String>) -> Self {
        self.nested.push(NestedSelector::Plain(selector.into()));
        self
    }

    pub fn nested_with(mut self, selector: impl Into<String>, options: RegionOptions) -> Self {
        self.nested.push(NestedSelector::Detailed {
            selector: selector.into(),
            options,
        });
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.options.repeatable = Some(repeatable);
        self
    }

    pub fn clone_focused_element(mut self, enabled: bool) -> Self {
        self.options.clone_focused_element = Some(enabled);
        self
    }

    pub fn disallow_default_enter(mut self, disallow: bool) -> Self {
        self.options.disallow_default_enter = Some(disallow);
        self
    }

    pub fn image_library(mut self, images: Vec<ImageAsset>) -> Self {
        self.options.image_library = Some(images);
        self
    }

    pub fn backends<I, S>(mut self, backends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.backends = Some(backends.into_iter().map(Into::into).collect());
        self
    }

    pub fn top_level_key(mut self, key: impl Into<String>) -> Self {
        self.options.local_storage_backend = Some(LocalStorageBackendConfig {
            top_level_key: Some(key.into()),
        });
        self
    }
}

/// Global editor configuration. Region options set here act as defaults for
/// every region.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Selector of the element the toolbar is appended to.
    pub append_toolbar_to: String,
    pub disable_dom_backend: bool,
    /// Entries appended after the built-in tool table.
    pub tools: ToolTable,
    pub path_attribute: String,
    pub proximity_margin: f32,
    #[serde(flatten)]
    pub defaults: RegionOptions,
    #[serde(skip)]
    pub tool_operates_on_element: Option<ToolFilter>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            append_toolbar_to: "body".to_string(),
            disable_dom_backend: false,
            tools: ToolTable::new(),
            path_attribute: DEFAULT_PATH_ATTRIBUTE.to_string(),
            proximity_margin: DEFAULT_PROXIMITY_MARGIN,
            defaults: RegionOptions::default(),
            tool_operates_on_element: None,
        }
    }
}

impl fmt::Debug for EditorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorConfig")
            .field("append_toolbar_to", &self.append_toolbar_to)
            .field("disable_dom_backend", &self.disable_dom_backend)
            .field("tools", &self.tools)
            .field("path_attribute", &self.path_attribute)
            .field("proximity_margin", &self.proximity_margin)
            .field("defaults", &self.defaults)
            .field(
                "tool_operates_on_element",
                &self.tool_operates_on_element.is_some(),
            )
            .finish()
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn append_toolbar_to(mut self, selector: impl Into<String>) -> Self {
        self.append_toolbar_to = selector.into();
        self
    }

    pub fn disable_dom_backend(mut self, disabled: bool) -> Self {
        self.disable_dom_backend = disabled;
        self
    }

    pub fn backends<I, S>(mut self, backends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults.backends = Some(backends.into_iter().map(Into::into).collect());
        self
    }

    pub fn top_level_key(mut self, key: impl Into<String>) -> Self {
        self.defaults.local_storage_backend = Some(LocalStorageBackendConfig {
            top_level_key: Some(key.into()),
        });
        self
    }

    pub fn image_library(mut self, images: Vec<ImageAsset>) -> Self {
        self.defaults.image_library = Some(images);
        self
    }

    pub fn path_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.path_attribute = attribute.into();
        self
    }

    pub fn proximity_margin(mut self, margin: f32) -> Self {
        self.proximity_margin = margin;
        self
    }

    pub fn tools(
        mut self,
        selector: &str,
        tools: Vec<ToolDefinition>,
    ) -> Result<Self, ConfigError> {
        self.tools.insert(selector, tools)?;
        Ok(self)
    }

    pub fn tool_operates_on_element(
        mut self,
        filter: impl Fn(&Document, &ToolMatch<'_>) -> bool + 'static,
    ) -> Self {
        self.tool_operates_on_element = Some(Rc::new(filter));
        self
    }
}

/// Effective configuration of one registered element.
#[derive(Clone)]
pub struct EditableConfig {
    /// Selector of the region the element belongs to.
    pub selector: String,
    /// Nested selector the element was matched by, if it is a nested child.
    pub nested_selector: Option<String>,
    pub nested: Vec<NestedSelector>,
    pub repeatable: bool,
    pub clone_focused_element: bool,
    pub disallow_default_enter: bool,
    pub image_library: Vec<ImageAsset>,
    /// Backend ids in dispatch order.
    pub backends: Vec<String>,
    pub top_level_key: Option<String>,
    pub path_attribute: String,
    pub proximity_margin: f32,
    pub tool_operates_on_element: Option<ToolFilter>,
    disable_dom_backend: bool,
    options: RegionOptions,
}

impl fmt::Debug for EditableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableConfig")
            .field("selector", &self.selector)
            .field("nested_selector", &self.nested_selector)
            .field("repeatable", &self.repeatable)
            .field("clone_focused_element", &self.clone_focused_element)
            .field("disallow_default_enter", &self.disallow_default_enter)
            .field("backends", &self.backends)
            .field("top_level_key", &self.top_level_key)
            .field("path_attribute", &self.path_attribute)
            .finish_non_exhaustive()
    }
}

impl EditableConfig {
    /// Global defaults overridden by the region's own options.
    pub fn cascade(global: &EditorConfig, region: &RegionDescriptor) -> Self {
        let options = global.defaults.overridden_by(&region.options);
        let mut config = Self {
            selector: region.selector.clone(),
            nested_selector: None,
            nested: region.nested.clone(),
            repeatable: false,
            clone_focused_element: false,
            disallow_default_enter: false,
            image_library: Vec::new(),
            backends: Vec::new(),
            top_level_key: None,
            path_attribute: global.path_attribute.clone(),
            proximity_margin: global.proximity_margin,
            tool_operates_on_element: global.tool_operates_on_element.clone(),
            disable_dom_backend: global.disable_dom_backend,
            options,
        };
        config.apply_options();
        config
    }

    /// Configuration of a child matched by `nested`, further overridden by
    /// the nested selector's own options. Children are only repeatable when
    /// their own options say so.
    pub fn for_nested(&self, nested: &NestedSelector) -> Self {
        let mut inherited = self.options.clone();
        inherited.repeatable = None;

        let mut config = self.clone();
        config.nested_selector = Some(nested.selector().to_string());
        config.nested = Vec::new();
        config.options = match nested.options() {
            Some(options) => inherited.overridden_by(options),
            None => inherited,
        };
        config.apply_options();
        config
    }

    pub fn is_nested(&self) -> bool {
        self.nested_selector.is_some()
    }

    pub fn uses_backend(&self, id: &str) -> bool {
        self.backends.iter().any(|b| b == id)
    }

    pub fn top_level_key(&self) -> Result<&str, ConfigError> {
        self.top_level_key
            .as_deref()
            .ok_or(ConfigError::MissingTopLevelKey)
    }

    /// Checks the requirements every dispatch relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backends.is_empty() {
            return Err(ConfigError::NoBackends {
                selector: self.selector.clone(),
            });
        }
        if self.uses_backend(LOCAL_STORAGE_BACKEND_ID) {
            self.top_level_key()?;
        }
        Ok(())
    }

    fn apply_options(&mut self) {
        let options = &self.options;
        self.repeatable = options.repeatable.unwrap_or(false);
        self.clone_focused_element = options.clone_focused_element.unwrap_or(false);
        self.disallow_default_enter = options.disallow_default_enter.unwrap_or(false);
        self.image_library = options.image_library.clone().unwrap_or_default();
        self.top_level_key = options
            .local_storage_backend
            .as_ref()
            .and_then(|c| c.top_level_key.clone());

        let mut backends = options.backends.clone().unwrap_or_default();
        if self.disable_dom_backend {
            backends.retain(|b| b != DOM_BACKEND_ID);
        } else if !backends.iter().any(|b| b == DOM_BACKEND_ID) {
            backends.insert(0, DOM_BACKEND_ID.to_string());
        }
        self.backends = backends;
    }
}
