//! Hearth stores: bindable data synchronized over a transport
//!
//! - `Store`: the Store Object, a shared handle over bound data plus a
//!   load/submit cycle
//! - `BoundData`: the live data binding views attach to
//! - `Transport`: the request/response boundary stores talk through
//!
//! # Example
//!
//! ```rust
//! use hearth_core::ClassRegistry;
//! use hearth_store::{store_base_definition, Store, StoreConfig};
//!
//! let registry = ClassRegistry::new();
//! registry.replace(store_base_definition());
//!
//! let store = Store::new(&registry, StoreConfig::with_data(serde_json::json!({"name": "bob"})), None).unwrap();
//! assert!(store.is_data_initialised());
//! assert_eq!(store.to_json(), r#"{"name":"bob"}"#);
//! ```

mod config;
mod data;
mod error;
mod store;
pub mod transport;

pub use config::{StoreConfig, StoreUrl};
pub use data::{BoundData, StoreData};
pub use error::{Result, StoreError};
pub use store::{store_base_definition, Store, StoreStatus, STORE_BASE_CLASS};
pub use transport::{DataType, Method, Transport, TransportRequest, TransportResponse};
