//! The Store Object.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use hearth_core::{
    ClassDefinition, ClassRegistry, EventBus, Instance, Members, Name, ObjectId, Value, BASE_CLASS,
};

use crate::config::StoreConfig;
use crate::data::{BoundData, StoreData};
use crate::error::{Result, StoreError};
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// Name of the built-in store class.
pub const STORE_BASE_CLASS: &str = "hearth.store.Base";

/// The built-in store class: the root base class plus store defaults.
pub fn store_base_definition() -> ClassDefinition {
    ClassDefinition::new(Name::from_static(STORE_BASE_CLASS))
        .extends(Name::from_static(BASE_CLASS))
        .field("dataType", "json")
        .field("protocol", "POST")
        .field("autoLoad", false)
        .field("root", "root")
        .field("url", Value::Null)
        .field("data", Value::Null)
}

/// Where a store is in its load/submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// Just created.
    Initial,
    /// A load request is in flight, or the last one failed.
    Preload,
    /// A submit request is in flight, or the last one failed.
    Presubmit,
    /// The last request completed with this transport status.
    Done(u16),
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreStatus::Initial => write!(f, "initial"),
            StoreStatus::Preload => write!(f, "preload"),
            StoreStatus::Presubmit => write!(f, "presubmit"),
            StoreStatus::Done(status) => write!(f, "{}", status),
        }
    }
}

struct StoreState {
    data: Option<BoundData>,
    initial: Value,
    status: StoreStatus,
}

struct StoreInner {
    id: ObjectId,
    class: Name,
    instance: Mutex<Instance>,
    events: EventBus,
    config: StoreConfig,
    transport: Option<Arc<dyn Transport>>,
    state: Mutex<StoreState>,
}

/// A bindable data payload, optionally synchronized with an endpoint.
///
/// Cloning a `Store` yields another handle to the same store, so views and
/// application code can share one. Local signals fired on the store's own
/// bus:
///
/// - `loaded` (payload) after a successful load
/// - `beforeSubmit` (JSON string) just before a submit request is sent
/// - `submitted` (response body) after a successful submit
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create an anonymous store from a config.
    pub fn new(
        registry: &ClassRegistry,
        config: StoreConfig,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self> {
        let instance = registry.prepare(&Name::from_static(STORE_BASE_CLASS), None)?;
        Self::build(instance, config, transport)
    }

    /// Create a store from a registered class, reading its store fields.
    pub fn from_class(
        registry: &ClassRegistry,
        name: &Name,
        overrides: Option<Members>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self> {
        let instance = registry.prepare(name, overrides)?;
        let config = StoreConfig::from_instance(&instance);
        Self::build(instance, config, transport)
    }

    /// Bind initial data, then construct the underlying instance.
    ///
    /// Stores that auto-load leave their data unbound; the caller is
    /// expected to [`load`](Self::load) them.
    fn build(
        mut instance: Instance,
        config: StoreConfig,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self> {
        let mut state = StoreState {
            data: None,
            initial: Value::Null,
            status: StoreStatus::Initial,
        };
        if !config.auto_load && !config.data.is_null() {
            state.initial = config.data.clone();
            state.data = Some(BoundData::new(config.data.clone()));
        }

        instance.construct()?;
        let store = Store {
            inner: Arc::new(StoreInner {
                id: instance.id(),
                class: instance.class_name().clone(),
                events: instance.events().clone(),
                instance: Mutex::new(instance),
                config,
                transport,
                state: Mutex::new(state),
            }),
        };
        tracing::debug!(store = %store.inner.class, id = %store.inner.id, "store created");
        Ok(store)
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn class_name(&self) -> &Name {
        &self.inner.class
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// The store's own event bus.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn status(&self) -> StoreStatus {
        self.inner.state.lock().status
    }

    pub fn auto_load(&self) -> bool {
        self.inner.config.auto_load
    }

    pub fn is_data_initialised(&self) -> bool {
        self.inner.state.lock().data.is_some()
    }

    /// The bound data, if any has been set.
    pub fn data(&self) -> Option<BoundData> {
        self.inner.state.lock().data.clone()
    }

    /// Whether both handles refer to the same store.
    pub fn same_store(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Invoke an operation of the store's class.
    pub fn call(&self, operation: &str, args: &[Value]) -> Result<Value> {
        Ok(self.inner.instance.lock().call(operation, args)?)
    }

    /// Set or update the store's data.
    ///
    /// The first call establishes the binding: plain data is wrapped, an
    /// existing binding is adopted as-is. Later calls merge plain data into
    /// the existing binding in place; passing a binding again is rejected
    /// with [`StoreError::RebindAlreadyBoundData`].
    pub fn set_data(&self, data: impl Into<StoreData>) -> Result<BoundData> {
        let data = data.into();
        let mut state = self.inner.state.lock();
        let existing = state.data.clone();
        match (existing, data) {
            (None, StoreData::Plain(value)) => {
                state.initial = value.clone();
                let bound = BoundData::new(value);
                state.data = Some(bound.clone());
                Ok(bound)
            }
            (None, StoreData::Bound(bound)) => {
                state.data = Some(bound.clone());
                Ok(bound)
            }
            (Some(existing), StoreData::Plain(value)) => {
                state.initial = value.clone();
                existing.merge(value);
                Ok(existing)
            }
            (Some(_), StoreData::Bound(_)) => {
                tracing::error!(store = %self.inner.class, "cannot update store data using already-bound data");
                Err(StoreError::RebindAlreadyBoundData)
            }
        }
    }

    /// Plain copy of the data.
    ///
    /// With `initial` set, returns the plain data last passed to
    /// [`set_data`](Self::set_data) instead of the current bound state.
    pub fn raw_data(&self, initial: bool) -> Value {
        let state = self.inner.state.lock();
        if initial {
            return state.initial.clone();
        }
        state
            .data
            .as_ref()
            .map(BoundData::snapshot)
            .unwrap_or(Value::Null)
    }

    /// Current data as a plain value.
    pub fn to_plain(&self) -> Value {
        self.raw_data(false)
    }

    /// Current data serialized as a JSON string.
    pub fn to_json(&self) -> String {
        self.to_plain().to_json().to_string()
    }

    /// Load from the get endpoint on the blocking pool.
    ///
    /// On success the payload is merged into the store, the status becomes
    /// the transport status and `loaded` fires. On failure the error is
    /// logged and the status stays [`StoreStatus::Preload`].
    pub async fn load(&self) -> Result<Value> {
        let (transport, request) = self.begin_load()?;
        let result = tokio::task::spawn_blocking(move || transport.request(&request))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?;
        self.finish_load(result)
    }

    /// Load from the get endpoint, blocking the current thread.
    pub fn load_sync(&self) -> Result<Value> {
        let (transport, request) = self.begin_load()?;
        let result = transport.request(&request);
        self.finish_load(result)
    }

    fn begin_load(&self) -> Result<(Arc<dyn Transport>, TransportRequest)> {
        let config = &self.inner.config;
        let Some(url) = config.url.get.clone() else {
            tracing::warn!(store = %self.inner.class, "unable to load store, no get path found (url.get)");
            return Err(StoreError::LoadEndpointMissing);
        };
        let transport = self.transport()?;
        self.inner.state.lock().status = StoreStatus::Preload;
        Ok((
            transport,
            TransportRequest::get(url).with_data_type(config.data_type),
        ))
    }

    fn finish_load(&self, result: std::result::Result<TransportResponse, String>) -> Result<Value> {
        let url = self.inner.config.url.get.clone().unwrap_or_default();
        let response = match result {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!(store = %self.inner.class, %url, status = response.status, "unable to load store");
                return Err(StoreError::UnexpectedStatus {
                    url,
                    status: response.status,
                });
            }
            Err(message) => {
                tracing::warn!(store = %self.inner.class, %url, error = %message, "unable to load store");
                return Err(StoreError::Transport(message));
            }
        };

        let payload = response.payload(self.inner.config.data_type);
        self.set_data(payload.clone())?;
        self.inner.state.lock().status = StoreStatus::Done(response.status);
        self.inner.events.publish("loaded", std::slice::from_ref(&payload));
        Ok(payload)
    }

    /// Post the data to the submit endpoint on the blocking pool.
    ///
    /// The request payload is `{"data": <json string>}` sent with the
    /// configured protocol. Without a submit endpoint this logs an error
    /// and returns [`StoreError::SubmitEndpointMissing`] without any
    /// request being made.
    pub async fn submit(&self) -> Result<Value> {
        let (transport, request) = self.begin_submit()?;
        let result = tokio::task::spawn_blocking(move || transport.request(&request))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?;
        self.finish_submit(result)
    }

    /// Submit, blocking the current thread.
    pub fn submit_sync(&self) -> Result<Value> {
        let (transport, request) = self.begin_submit()?;
        let result = transport.request(&request);
        self.finish_submit(result)
    }

    fn begin_submit(&self) -> Result<(Arc<dyn Transport>, TransportRequest)> {
        let config = &self.inner.config;
        let Some(url) = config.url.submit.clone() else {
            tracing::error!(store = %self.inner.class, "unable to submit store, no submit path found (url.submit)");
            return Err(StoreError::SubmitEndpointMissing);
        };
        let transport = self.transport()?;
        self.inner.state.lock().status = StoreStatus::Presubmit;

        let json = self.to_json();
        self.inner
            .events
            .publish("beforeSubmit", &[Value::String(json.clone())]);

        let request = TransportRequest::new(config.protocol, url)
            .with_data_type(config.data_type)
            .with_payload(serde_json::json!({ "data": json }));
        Ok((transport, request))
    }

    fn finish_submit(&self, result: std::result::Result<TransportResponse, String>) -> Result<Value> {
        let url = self.inner.config.url.submit.clone().unwrap_or_default();
        match result {
            Ok(response) if response.is_success() => {
                self.inner.state.lock().status = StoreStatus::Done(response.status);
                let body = response.payload(self.inner.config.data_type);
                self.inner
                    .events
                    .publish("submitted", std::slice::from_ref(&body));
                Ok(body)
            }
            Ok(response) => {
                tracing::error!(store = %self.inner.class, %url, status = response.status, "error submitting data for store");
                Err(StoreError::UnexpectedStatus {
                    url,
                    status: response.status,
                })
            }
            Err(message) => {
                tracing::error!(store = %self.inner.class, %url, error = %message, "error submitting data for store");
                Err(StoreError::Transport(message))
            }
        }
    }

    fn transport(&self) -> Result<Arc<dyn Transport>> {
        self.inner.transport.clone().ok_or_else(|| {
            tracing::warn!(store = %self.inner.class, "store has no transport");
            StoreError::NoTransport
        })
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Store")
            .field("class", &self.inner.class.to_string())
            .field("id", &self.inner.id)
            .field("status", &state.status)
            .field("data", &state.data)
            .finish()
    }
}
