//! Configuration for include elements.

use std::path::Path;

use dom::custom_element_definition::is_valid_custom_element_name;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fetch::RequestMode;

pub const DEFAULT_TAG_NAME: &str = "lazy-html-include";
pub const DEFAULT_BASE_STYLE: &str = "<style>:host { display: block; }</style>";

/// Settings shared by every include element of a document.
///
/// ```toml
/// tag_name = "site-include"
/// default_request_mode = "same-origin"
/// base_style = "<style>:host { display: contents; }</style>"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncludeConfig {
    /// Element name the include element is defined under.
    pub tag_name: String,
    /// Mode used when `request-mode` is absent or unrecognized.
    pub default_request_mode: RequestMode,
    /// Markup mounted ahead of the fragment in the shadow root.
    pub base_style: String,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            tag_name: DEFAULT_TAG_NAME.to_string(),
            default_request_mode: RequestMode::default(),
            base_style: DEFAULT_BASE_STYLE.to_string(),
        }
    }
}

impl IncludeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: IncludeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading include config");
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_custom_element_name(&self.tag_name) {
            return Err(ConfigError::InvalidTagName(self.tag_name.clone()));
        }
        Ok(())
    }
}
