//! Memoizing resource loader.
//!
//! Maps logical names to concrete paths and fetches each (name, kind) pair
//! at most once. Concurrent requests for a resource that is still in flight
//! wait on the same fetch instead of issuing their own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::boundary::{Fetcher, ResourceKind};
use crate::config::RuntimeConfig;
use crate::error::{Result, ViewError};

type Entry = Arc<OnceCell<Result<Arc<str>>>>;

/// Fetches resources by logical name, once.
///
/// Both successes and failures are remembered; [`forget`](Self::forget)
/// drops a remembered result so the next request fetches again.
pub struct ResourceLoader {
    fetcher: Arc<dyn Fetcher>,
    app_name: String,
    app_path: String,
    markup_extension: String,
    script_extension: String,
    cache: bool,
    entries: Mutex<HashMap<(String, ResourceKind), Entry>>,
    bust: AtomicU64,
}

impl ResourceLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &RuntimeConfig) -> Self {
        Self {
            fetcher,
            app_name: config.app_name.clone(),
            app_path: config.app_path.clone(),
            markup_extension: config.markup_extension.clone(),
            script_extension: config.script_extension.clone(),
            cache: config.cache,
            entries: Mutex::new(HashMap::new()),
            bust: AtomicU64::new(0),
        }
    }

    /// Concrete path of a logical name.
    ///
    /// `MyApp.view.Index` becomes `<app_path>/view/Index.<ext>` when the
    /// app is named `MyApp`; names outside the app resolve to
    /// `<app_path>/<name>` unchanged.
    pub fn resolve_path(&self, name: &str, kind: ResourceKind) -> String {
        let home = self.app_path.strip_suffix('/').unwrap_or(&self.app_path);
        let name = name.trim();

        if let Some(rest) = name.strip_prefix(self.app_name.as_str()) {
            if rest.starts_with('.') {
                let extension = match kind {
                    ResourceKind::Markup => &self.markup_extension,
                    ResourceKind::Script => &self.script_extension,
                };
                return format!("{}{}.{}", home, rest.replace('.', "/"), extension);
            }
        }

        format!("{}/{}", home, name)
    }

    fn fetch_url(&self, path: &str) -> String {
        if self.cache {
            return path.to_string();
        }
        let n = self.bust.fetch_add(1, Ordering::Relaxed);
        format!("{}?hb={}", path, n)
    }

    /// Fetch a resource, or wait for / reuse an earlier fetch of it.
    pub async fn require(&self, name: &str, kind: ResourceKind) -> Result<Arc<str>> {
        let entry = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry((name.to_string(), kind)).or_default())
        };

        entry
            .get_or_init(|| async {
                let path = self.resolve_path(name, kind);
                let url = self.fetch_url(&path);
                tracing::debug!(name, %url, "fetching resource");
                match self.fetcher.fetch(&url, kind).await {
                    Ok(content) => Ok(Arc::from(content)),
                    Err(message) => {
                        tracing::warn!(name, %path, error = %message, "unable to load resource");
                        Err(ViewError::ResourceLoadFailed {
                            name: name.to_string(),
                            path,
                            message,
                        })
                    }
                }
            })
            .await
            .clone()
    }

    /// Fetch several resources, returning each result in order.
    pub async fn require_all(&self, names: &[&str], kind: ResourceKind) -> Vec<Result<Arc<str>>> {
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            results.push(self.require(name, kind).await);
        }
        results
    }

    /// Whether a resource has been fetched successfully.
    pub fn is_loaded(&self, name: &str, kind: ResourceKind) -> bool {
        self.entries
            .lock()
            .get(&(name.to_string(), kind))
            .and_then(|entry| entry.get())
            .is_some_and(|result| result.is_ok())
    }

    /// Drop a remembered result. Returns whether one was present.
    pub fn forget(&self, name: &str, kind: ResourceKind) -> bool {
        self.entries
            .lock()
            .remove(&(name.to_string(), kind))
            .is_some()
    }
}
