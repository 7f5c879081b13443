//! Blocking reqwest transport for stores.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use url::Url;

use hearth_store::{DataType, Method, Transport, TransportRequest, TransportResponse};

use crate::error::Error;

pub(crate) fn to_http_method(method: Method) -> http::Method {
    match method {
        Method::GET => http::Method::GET,
        Method::POST => http::Method::POST,
        Method::PUT => http::Method::PUT,
        Method::DELETE => http::Method::DELETE,
        Method::PATCH => http::Method::PATCH,
    }
}

/// Parse `url`, joining it onto `base` when one is set.
pub(crate) fn resolve_url(base: Option<&Url>, url: &str) -> Result<Url, Error> {
    Ok(match base {
        Some(base) => base.join(url)?,
        None => Url::parse(url)?,
    })
}

fn accept(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Json => "application/json",
        DataType::Text => "text/plain, */*",
    }
}

/// Store transport over a blocking reqwest client.
///
/// Must not be called from inside an async context; stores run it on the
/// blocking pool.
pub struct ReqwestTransport {
    client: Client,
    base: Option<Url>,
    headers: HeaderMap,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: None,
            headers: HeaderMap::new(),
        })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(Duration::from_secs(30))
    }

    /// Resolve relative store URLs against `base`.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, Error> {
        self.base = Some(Url::parse(base)?);
        Ok(self)
    }

    /// Send `name: value` with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        self.headers
            .insert(HeaderName::try_from(name)?, HeaderValue::try_from(value)?);
        Ok(self)
    }

    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, Error> {
        let url = resolve_url(self.base.as_ref(), &request.url)?;

        let mut builder = self
            .client
            .request(to_http_method(request.method), url.clone())
            .headers(self.headers.clone())
            .header(ACCEPT, accept(request.data_type));
        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response.text()?;
        let body = serde_json::from_str(&body_text).unwrap_or(serde_json::Value::Null);
        tracing::debug!(method = ?request.method, %url, status, "store request completed");

        Ok(TransportResponse {
            status,
            headers,
            body,
            body_text: Some(body_text),
        })
    }
}

impl Transport for ReqwestTransport {
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, String> {
        self.send(request).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_urls_join_base() {
        let base = Url::parse("http://localhost:8080/api/").unwrap();
        assert_eq!(
            resolve_url(Some(&base), "users/1").unwrap().as_str(),
            "http://localhost:8080/api/users/1"
        );
        assert_eq!(
            resolve_url(Some(&base), "/root?x=1").unwrap().as_str(),
            "http://localhost:8080/root?x=1"
        );
    }

    #[test]
    fn relative_url_without_base_fails() {
        assert!(matches!(resolve_url(None, "/users"), Err(Error::UrlParse(_))));
    }

    #[test]
    fn methods_convert() {
        assert_eq!(to_http_method(Method::PATCH), http::Method::PATCH);
        assert_eq!(to_http_method(Method::default()), http::Method::GET);
    }

    #[test]
    fn invalid_header_is_rejected() {
        let result = ReqwestTransport::with_default_timeout()
            .unwrap()
            .with_header("bad header", "x");
        assert!(matches!(result, Err(Error::InvalidHeaderName(_))));
    }
}
