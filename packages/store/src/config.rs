//! Store configuration.

use serde::{Deserialize, Serialize};

use hearth_core::{Instance, Value};

use crate::transport::{DataType, Method};

/// Endpoints a store talks to.
///
/// Deserializes from either a plain string (a get-only store) or a map with
/// `get` and `submit` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UrlSpec")]
pub struct StoreUrl {
    pub get: Option<String>,
    pub submit: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UrlSpec {
    Get(String),
    Both {
        #[serde(default)]
        get: Option<String>,
        #[serde(default)]
        submit: Option<String>,
    },
}

impl From<UrlSpec> for StoreUrl {
    fn from(spec: UrlSpec) -> Self {
        match spec {
            UrlSpec::Get(get) => StoreUrl::get(get),
            UrlSpec::Both { get, submit } => StoreUrl { get, submit },
        }
    }
}

impl StoreUrl {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            get: Some(url.into()),
            submit: None,
        }
    }

    pub fn with_submit(mut self, url: impl Into<String>) -> Self {
        self.submit = Some(url.into());
        self
    }

    /// Read from a class field value: a string or a `{get, submit}` map.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(url) => StoreUrl::get(url.clone()),
            Value::Map(_) => StoreUrl {
                get: value.get("get").and_then(Value::as_str).map(str::to_string),
                submit: value.get("submit").and_then(Value::as_str).map(str::to_string),
            },
            _ => StoreUrl::default(),
        }
    }
}

/// How a store loads and submits its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    pub url: StoreUrl,
    /// Method used by `submit`.
    pub protocol: Method,
    pub data_type: DataType,
    /// Load as soon as the store is created.
    pub auto_load: bool,
    /// Initial data, bound at creation when `auto_load` is off.
    pub data: Value,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: StoreUrl::default(),
            protocol: Method::POST,
            data_type: DataType::Json,
            auto_load: false,
            data: Value::Null,
        }
    }
}

impl StoreConfig {
    /// A config holding only initial data.
    pub fn with_data(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Read the store fields of a class instance.
    ///
    /// Recognised fields: `url`, `protocol`, `dataType`, `autoLoad`, `data`.
    /// Missing or malformed fields keep their defaults.
    pub fn from_instance(instance: &Instance) -> Self {
        let mut config = StoreConfig::default();
        if let Some(url) = instance.get("url") {
            config.url = StoreUrl::from_value(url);
        }
        if let Some(protocol) = instance.get("protocol") {
            if let Ok(method) = serde_json::from_value(protocol.to_json()) {
                config.protocol = method;
            }
        }
        if let Some(data_type) = instance.get("dataType") {
            if let Ok(data_type) = serde_json::from_value(data_type.to_json()) {
                config.data_type = data_type;
            }
        }
        if let Some(auto_load) = instance.get("autoLoad").and_then(Value::as_bool) {
            config.auto_load = auto_load;
        }
        if let Some(data) = instance.get("data") {
            config.data = data.clone();
        }
        config
    }
}
