//! Runtime configuration.

use serde::{Deserialize, Serialize};

/// Placeholder markup shown while a view's template loads.
pub const DEFAULT_LOADING_TEMPLATE: &str =
    "<div class='hb-view-loader'><span class='hb-spinner'></span></div>";

/// Configuration for the Hearth runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Leading component of the application's logical names.
    pub app_name: String,

    /// Root path logical names under `app_name` are mapped into.
    pub app_path: String,

    /// Extension appended to markup resources.
    pub markup_extension: String,

    /// Extension appended to script resources.
    pub script_extension: String,

    /// When false, fetch URLs carry a cache-busting `hb=<n>` argument.
    pub cache: bool,

    /// Markup shown before a view's target while its template loads.
    pub loading_template: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            app_name: "App".to_string(),
            app_path: "/".to_string(),
            markup_extension: "html".to_string(),
            script_extension: "js".to_string(),
            cache: true,
            loading_template: DEFAULT_LOADING_TEMPLATE.to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn new(app_name: impl Into<String>, app_path: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_path: app_path.into(),
            ..Default::default()
        }
    }
}
