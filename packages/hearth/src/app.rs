//! Application bootstrap.

use std::sync::Arc;

use hearth_http::{HttpFetcher, ReqwestTransport};
use hearth_store::{StoreConfig, StoreUrl};
use hearth_view::{Binder, Collaborators, Renderer, Runtime, ViewHandle, ViewOptions};

use crate::config::AppConfig;
use crate::error::Result;
use crate::lang::Languages;

/// What [`start`] brought up.
pub struct App {
    pub runtime: Runtime,
    /// The index view, when auto-rendering.
    pub index: Option<ViewHandle>,
    /// Language keys, when configured.
    pub languages: Option<Languages>,
}

/// Build a runtime that fetches templates and talks to stores over HTTP.
///
/// Logical names resolve under `config.runtime.app_path`, which is joined
/// onto `base_url`; relative store URLs are joined onto `base_url` too.
pub fn connect(
    config: &AppConfig,
    base_url: &str,
    renderer: Arc<dyn Renderer>,
    binder: Arc<dyn Binder>,
) -> Result<Runtime> {
    let fetcher = HttpFetcher::with_default_timeout(base_url)?;
    let transport = ReqwestTransport::with_default_timeout()?.with_base_url(base_url)?;
    Ok(Runtime::new(
        config.runtime.clone(),
        Collaborators {
            fetcher: Arc::new(fetcher),
            renderer,
            binder,
            transport: Some(Arc::new(transport)),
        },
    ))
}

/// Start an application on `runtime`.
///
/// Loads the language keys when `lang` is set, then creates and renders
/// `<app_name>.view.Index` into `index_target` when `auto_render` is on.
/// A failure loading the language keys is logged and leaves the keys
/// empty; a failure creating the index view is returned.
pub async fn start(runtime: &Runtime, config: &AppConfig) -> Result<App> {
    let languages = match &config.lang {
        Some(url) => {
            let store = runtime
                .create_store(StoreConfig {
                    url: StoreUrl::get(url.clone()),
                    auto_load: true,
                    ..Default::default()
                })
                .await?;
            Some(Languages::new(store, config.default_lang.clone()))
        }
        None => None,
    };

    let index = if config.auto_render {
        let mut options = ViewOptions::new().target(config.index_target.as_str());
        if !config.view_data.is_null() {
            options = options.data(config.view_data.clone());
        }
        Some(runtime.create_view(config.index_view(), options).await?)
    } else {
        None
    };

    tracing::info!(app = %config.runtime.app_name, rendered = index.is_some(), "application started");
    Ok(App {
        runtime: runtime.clone(),
        index,
        languages,
    })
}
