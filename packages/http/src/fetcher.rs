//! Async resource fetcher for the view loader.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use url::Url;

use hearth_view::{Fetcher, ResourceKind};

use crate::error::Error;
use crate::transport::resolve_url;

/// Fetches templates and scripts over HTTP.
///
/// Loader paths are absolute paths such as `/app/view/Index.html`; they
/// are joined onto the base URL.
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: Url::parse(base)?,
        })
    }

    pub fn with_default_timeout(base: &str) -> Result<Self, Error> {
        Self::new(base, Duration::from_secs(30))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get(&self, path: &str, kind: ResourceKind) -> Result<String, Error> {
        let url = resolve_url(Some(&self.base), path)?;
        let accept = match kind {
            ResourceKind::Markup => "text/html, */*",
            ResourceKind::Script => "application/javascript, */*",
        };

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        tracing::debug!(%url, ?kind, "resource fetched");
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str, kind: ResourceKind) -> Result<String, String> {
        self.get(path, kind).await.map_err(|e| e.to_string())
    }
}
