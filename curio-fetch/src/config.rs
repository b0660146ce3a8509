//! Fetcher configuration.
//!
//! Sources are declared in a TOML file, one `[[fetcher]]` table each:
//!
//! ```toml
//! [[fetcher]]
//! name = "Local Books"
//! type = "exec"
//! path = "/usr/local/bin/isbn-lookup"
//! collection_type = "book"
//! update_args = "--isbn %{isbn}"
//!
//! [fetcher.args]
//! title = "-t %1"
//! isbn = "--isbn %1"
//! ```

use crate::error::FetchError;
use crate::fetcher::FetcherType;
use crate::request::FetchKey;
use curio_model::{CollectionType, ImportFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Every configured source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchersConfig {
    #[serde(rename = "fetcher", default)]
    pub fetchers: Vec<FetcherConfig>,
}

impl FetchersConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), fetchers = config.fetchers.len(), "fetcher config loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, FetchError> {
        Ok(toml::from_str(text)?)
    }
}

/// One source. Which settings matter depends on `fetcher_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Display name, also the source name in messages.
    pub name: String,

    #[serde(rename = "type")]
    pub fetcher_type: FetcherType,

    /// Program to run (exec).
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Argument template per search key (exec).
    #[serde(default)]
    pub args: BTreeMap<FetchKey, String>,

    /// Template for refreshing an existing entry; `%{field}` tokens are
    /// filled from the entry (exec).
    #[serde(default)]
    pub update_args: Option<String>,

    /// Kind of collection the program's results belong to (exec).
    #[serde(default)]
    pub collection_type: Option<CollectionType>,

    /// Format of the program's output (exec).
    #[serde(default)]
    pub format: ImportFormat,

    /// Whether the program should be removed along with this source (exec).
    #[serde(default)]
    pub delete_on_remove: bool,

    /// Extra fields to fill when the source can provide them.
    #[serde(default)]
    pub optional_fields: Vec<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides the service endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Overrides the cover image endpoint.
    #[serde(default)]
    pub cover_base_url: Option<String>,
}

impl FetcherConfig {
    /// A configuration with only the name and type set.
    pub fn new(name: impl Into<String>, fetcher_type: FetcherType) -> Self {
        Self {
            name: name.into(),
            fetcher_type,
            path: None,
            args: BTreeMap::new(),
            update_args: None,
            collection_type: None,
            format: ImportFormat::default(),
            delete_on_remove: false,
            optional_fields: Vec::new(),
            api_key: None,
            base_url: None,
            cover_base_url: None,
        }
    }

    pub fn wants_optional(&self, field: &str) -> bool {
        self.optional_fields.iter().any(|f| f == field)
    }

    pub(crate) fn missing(&self, setting: &'static str) -> FetchError {
        FetchError::MissingSetting {
            name: self.name.clone(),
            setting,
        }
    }
}
