//! The transport boundary stores load from and submit to.
//!
//! The trait is synchronous so implementations can wrap blocking clients;
//! async callers run it on the blocking pool.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use hearth_core::Value;

/// Request method.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
}

/// Expected shape of a response body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Parse the body as JSON.
    #[default]
    Json,
    /// Keep the body as a string.
    Text,
}

/// One request against a store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TransportRequest {
    #[serde(default)]
    pub method: Method,

    pub url: String,

    #[serde(default)]
    pub data_type: DataType,

    /// Request payload (sent as JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Response from a store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportResponse {
    pub status: u16,

    /// Response headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Body parsed as JSON, null if it was empty or not valid JSON
    pub body: serde_json::Value,

    /// Raw body text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
}

impl TransportResponse {
    /// A response carrying a JSON body.
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        let body_text = body.to_string();
        Self {
            status,
            headers: HashMap::new(),
            body,
            body_text: Some(body_text),
        }
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as a store value, interpreted per `data_type`.
    pub fn payload(&self, data_type: DataType) -> Value {
        match data_type {
            DataType::Json => Value::from(self.body.clone()),
            DataType::Text => match &self.body_text {
                Some(text) => Value::String(text.clone()),
                None => Value::from(self.body.clone()),
            },
        }
    }
}

/// Executes store requests.
///
/// Implementations can use real HTTP clients or canned responses for
/// testing. Failures are reported as a message.
pub trait Transport: Send + Sync {
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, String>;
}

/// Transport returning canned responses.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    /// A mock transport that returns predefined responses keyed by URL.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        responses: Arc<Mutex<HashMap<String, TransportResponse>>>,
        recorded_requests: Arc<Mutex<Vec<TransportRequest>>>,
        error_message: Arc<Mutex<Option<String>>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a response for a specific URL.
        pub fn with_response(self, url: impl Into<String>, response: TransportResponse) -> Self {
            self.responses.lock().insert(url.into(), response);
            self
        }

        /// Add a 200 JSON response for a specific URL.
        pub fn with_json(self, url: impl Into<String>, body: serde_json::Value) -> Self {
            self.with_response(url, TransportResponse::json(200, body))
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.error_message.lock() = Some(message.into());
            self
        }

        /// Get all recorded requests.
        pub fn recorded_requests(&self) -> Vec<TransportRequest> {
            self.recorded_requests.lock().clone()
        }

        pub fn request_count(&self) -> usize {
            self.recorded_requests.lock().len()
        }
    }

    impl Transport for MockTransport {
        fn request(&self, request: &TransportRequest) -> Result<TransportResponse, String> {
            self.recorded_requests.lock().push(request.clone());

            if let Some(message) = self.error_message.lock().clone() {
                return Err(message);
            }

            match self.responses.lock().get(&request.url) {
                Some(response) => Ok(response.clone()),
                None => Ok(TransportResponse::json(
                    404,
                    serde_json::json!({"error": "Not Found"}),
                )),
            }
        }
    }
}
