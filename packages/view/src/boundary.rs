//! Collaborator boundaries the view layer consumes.
//!
//! Views never touch markup or data bindings directly. They go through:
//! - [`Renderer`]: resolves targets, injects markup, toggles visibility
//! - [`Binder`]: attaches live data bindings to rendered elements
//! - [`Fetcher`]: retrieves resources by concrete path

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use hearth_core::ObjectId;
use hearth_store::BoundData;

/// Opaque reference to a rendered element, issued by a [`Renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u64);

impl Element {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Where a view renders: a selector to resolve, or an element in hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Selector(String),
    Element(Element),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Selector(selector) => write!(f, "{}", selector),
            Target::Element(element) => write!(f, "{}", element),
        }
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<Element> for Target {
    fn from(element: Element) -> Self {
        Target::Element(element)
    }
}

/// Markup injection and element visibility.
pub trait Renderer: Send + Sync {
    /// Resolve a target to an element, `None` if nothing matches.
    fn resolve_target(&self, target: &Target) -> Option<Element>;

    /// Replace the contents of `target` with `markup`.
    fn render_into(&self, target: &Element, markup: &str) -> Element;

    /// Insert `markup` as a new element just before `anchor`.
    fn insert_placeholder(&self, anchor: &Element, markup: &str) -> Option<Element>;

    /// Remove an element.
    fn remove(&self, element: &Element);

    fn show(&self, element: &Element);

    fn hide(&self, element: &Element);

    fn is_visible(&self, element: &Element) -> bool;

    /// The view whose data is bound to `element`, if any.
    fn bound_view(&self, element: &Element) -> Option<ObjectId>;

    /// Mark (or clear) the view bound to `element`.
    fn set_bound_view(&self, element: &Element, view: Option<ObjectId>);
}

/// Callback run once when a bound element is removed.
pub type RemovalCallback = Box<dyn FnOnce() + Send>;

/// Live data binding between bound data and rendered markup.
pub trait Binder: Send + Sync {
    fn apply_binding(&self, root: &Element, data: &BoundData);

    fn clean_binding(&self, root: &Element);

    /// Run `callback` once `root` is removed from the document.
    fn on_element_removed(&self, root: &Element, callback: RemovalCallback);
}

/// Kind of resource a logical name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Markup,
}

/// Retrieves a resource by concrete path.
///
/// Failures are reported as a message.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, path: &str, kind: ResourceKind) -> Result<String, String>;
}
