//! Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use hearth_core::Value;
use hearth_view::RuntimeConfig;

use crate::error::{Error, Result};

/// Everything needed to boot an application.
///
/// Runtime settings sit at the top level next to the bootstrap options:
///
/// ```json
/// {
///   "appName": "MyApp",
///   "appPath": "/static/app",
///   "cache": false,
///   "indexTarget": "#root",
///   "lang": "lang/keys.json"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(flatten)]
    pub runtime: RuntimeConfig,

    /// Create and render `<app_name>.view.Index` on start.
    pub auto_render: bool,

    /// Where the index view renders.
    pub index_target: String,

    /// Data handed to the index view.
    pub view_data: Value,

    /// URL of the language keys, loaded on start.
    pub lang: Option<String>,

    /// Language selected at start.
    pub default_lang: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            auto_render: true,
            index_target: "body".to_string(),
            view_data: Value::Null,
            lang: None,
            default_lang: "en".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Logical name of the index view.
    pub fn index_view(&self) -> String {
        format!("{}.view.Index", self.runtime.app_name)
    }
}

impl From<AppConfig> for RuntimeConfig {
    fn from(config: AppConfig) -> Self {
        config.runtime
    }
}
