//! # Hearth
//!
//! Class-based views and stores for client applications.
//!
//! This crate re-exports the layers and adds the application shell:
//!
//! - **hearth-core**: names, values, class registry, event buses
//! - **hearth-store**: bindable data loaded from and submitted to endpoints
//! - **hearth-view**: template loading, view lifecycle, the runtime
//! - **hearth-http**: HTTP transport and template fetcher
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use hearth::{connect, start, AppConfig};
//!
//! hearth::logging::init_logging();
//! let config = AppConfig::from_file("app.json")?;
//! let runtime = connect(&config, "http://localhost:8080", renderer, binder)?;
//! let app = start(&runtime, &config).await?;
//! ```

mod app;
mod config;
mod error;
mod lang;
pub mod logging;

pub use app::{connect, start, App};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use lang::Languages;

pub use hearth_core::{
    name, Call, ClassDefinition, ClassError, ClassRegistry, Event, EventBus, Instance, IntoName,
    Listener, Members, Name, ObjectId, Value,
};
pub use hearth_store::{Store, StoreConfig, StoreError, StoreStatus, StoreUrl};
pub use hearth_view::{
    signal, Binder, Collaborators, Element, Fetcher, Renderer, Runtime, RuntimeConfig, SubView,
    Target, ViewData, ViewError, ViewHandle, ViewOptions, ViewState,
};
