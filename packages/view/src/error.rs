//! Error types for views and the runtime.

use hearth_core::{ClassError, ObjectId};
use hearth_store::StoreError;
use thiserror::Error;

/// Errors raised by the view lifecycle and the runtime helpers.
///
/// Missing targets and failed loads are reported, not fatal: the view keeps
/// its current state and can be rendered or loaded again later.
#[derive(Debug, Clone, Error)]
pub enum ViewError {
    /// The view's render target did not resolve to an element.
    #[error("no render target found for {view}: {target}")]
    RenderTargetNotFound { view: String, target: String },

    /// Fetching a resource failed.
    #[error("unable to load '{name}' at {path}: {message}")]
    ResourceLoadFailed {
        name: String,
        path: String,
        message: String,
    },

    /// The view was asked to render before its template arrived.
    #[error("template for {view} is not loaded yet")]
    ContentNotReady { view: String },

    /// The view's rendered element was removed.
    #[error("view {0} has been destroyed")]
    ViewDestroyed(ObjectId),

    /// No view registered under this name or id.
    #[error("view not found: {0}")]
    ViewNotFound(String),

    /// Class registration or construction failed.
    #[error(transparent)]
    Class(#[from] ClassError),

    /// Creating or updating the view's store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failure_display() {
        let e = ViewError::ResourceLoadFailed {
            name: "App.view.Index".into(),
            path: "/app/view/Index.html".into(),
            message: "404".into(),
        };
        assert_eq!(
            e.to_string(),
            "unable to load 'App.view.Index' at /app/view/Index.html: 404"
        );
    }

    #[test]
    fn store_error_converts() {
        let e: ViewError = StoreError::RebindAlreadyBoundData.into();
        assert!(matches!(e, ViewError::Store(_)));
    }
}
