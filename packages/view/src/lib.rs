//! Hearth views
//!
//! Template loading, the view render lifecycle and the runtime context that
//! ties classes, stores and views together.
//!
//! The view layer never touches a document directly. It works through three
//! collaborators supplied to [`Runtime::new`]:
//! - a [`Fetcher`] that retrieves templates by path
//! - a [`Renderer`] that resolves targets and injects markup
//! - a [`Binder`] that attaches bound data to rendered elements
//!
//! In-memory versions of all three live in `testing` behind the
//! `test-utils` feature.

mod boundary;
mod config;
mod error;
mod loader;
mod runtime;
mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use boundary::{Binder, Element, Fetcher, RemovalCallback, Renderer, ResourceKind, Target};
pub use config::{RuntimeConfig, DEFAULT_LOADING_TEMPLATE};
pub use error::{Result, ViewError};
pub use loader::ResourceLoader;
pub use runtime::{Collaborators, Runtime};
pub use view::{
    signal, view_base_definition, SubView, ViewData, ViewHandle, ViewOptions, ViewState,
    VIEW_BASE_CLASS,
};
