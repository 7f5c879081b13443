//! In-memory collaborators for tests.
//!
//! - [`MemoryDom`]: a renderer over a flat table of elements
//! - [`RecordingBinder`]: a binder that records calls and lets tests fire
//!   element removal
//! - [`StaticFetcher`]: a fetcher serving fixed content, optionally held
//!   behind a gate so tests can keep a fetch in flight

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use hearth_core::{ObjectId, Value};
use hearth_store::BoundData;

use crate::boundary::{Binder, Element, Fetcher, RemovalCallback, Renderer, ResourceKind, Target};

#[derive(Debug, Clone, Default)]
struct Node {
    selector: Option<String>,
    markup: String,
    visible: bool,
    bound_view: Option<ObjectId>,
    before: Option<Element>,
    renders: usize,
}

/// A renderer backed by an in-memory element table.
#[derive(Clone, Default)]
pub struct MemoryDom {
    nodes: Arc<Mutex<BTreeMap<Element, Node>>>,
    next: Arc<AtomicU64>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self, node: Node) -> Element {
        let element = Element::new(self.next.fetch_add(1, Ordering::Relaxed));
        self.nodes.lock().insert(element, node);
        element
    }

    /// Add a visible, empty element reachable through `selector`.
    pub fn add_target(&self, selector: &str) -> Element {
        self.allocate(Node {
            selector: Some(selector.to_string()),
            visible: true,
            ..Default::default()
        })
    }

    /// Remove an element from the table without running any hooks.
    pub fn detach(&self, element: &Element) -> bool {
        self.nodes.lock().remove(element).is_some()
    }

    pub fn contains(&self, element: &Element) -> bool {
        self.nodes.lock().contains_key(element)
    }

    /// Current markup of an element.
    pub fn markup(&self, element: &Element) -> Option<String> {
        self.nodes.lock().get(element).map(|n| n.markup.clone())
    }

    /// How many times markup was rendered into an element.
    pub fn render_count(&self, element: &Element) -> usize {
        self.nodes.lock().get(element).map_or(0, |n| n.renders)
    }

    /// Placeholders currently inserted before `anchor`.
    pub fn placeholders_before(&self, anchor: &Element) -> Vec<Element> {
        self.nodes
            .lock()
            .iter()
            .filter(|(_, n)| n.before == Some(*anchor))
            .map(|(e, _)| *e)
            .collect()
    }
}

impl Renderer for MemoryDom {
    fn resolve_target(&self, target: &Target) -> Option<Element> {
        let nodes = self.nodes.lock();
        match target {
            Target::Element(element) => nodes.contains_key(element).then_some(*element),
            Target::Selector(selector) => nodes
                .iter()
                .find(|(_, n)| n.selector.as_deref() == Some(selector.as_str()))
                .map(|(e, _)| *e),
        }
    }

    fn render_into(&self, target: &Element, markup: &str) -> Element {
        if let Some(node) = self.nodes.lock().get_mut(target) {
            node.markup = markup.to_string();
            node.renders += 1;
        }
        *target
    }

    fn insert_placeholder(&self, anchor: &Element, markup: &str) -> Option<Element> {
        if !self.contains(anchor) {
            return None;
        }
        Some(self.allocate(Node {
            markup: markup.to_string(),
            visible: true,
            before: Some(*anchor),
            ..Default::default()
        }))
    }

    fn remove(&self, element: &Element) {
        self.nodes.lock().remove(element);
    }

    fn show(&self, element: &Element) {
        if let Some(node) = self.nodes.lock().get_mut(element) {
            node.visible = true;
        }
    }

    fn hide(&self, element: &Element) {
        if let Some(node) = self.nodes.lock().get_mut(element) {
            node.visible = false;
        }
    }

    fn is_visible(&self, element: &Element) -> bool {
        self.nodes.lock().get(element).is_some_and(|n| n.visible)
    }

    fn bound_view(&self, element: &Element) -> Option<ObjectId> {
        self.nodes.lock().get(element).and_then(|n| n.bound_view)
    }

    fn set_bound_view(&self, element: &Element, view: Option<ObjectId>) {
        if let Some(node) = self.nodes.lock().get_mut(element) {
            node.bound_view = view;
        }
    }
}

/// A binder that records what it was asked to do.
#[derive(Clone, Default)]
pub struct RecordingBinder {
    applied: Arc<Mutex<Vec<(Element, BoundData)>>>,
    cleaned: Arc<Mutex<Vec<Element>>>,
    removal_hooks: Arc<Mutex<HashMap<Element, Vec<RemovalCallback>>>>,
}

impl RecordingBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements bindings were applied to, in order.
    pub fn applied(&self) -> Vec<Element> {
        self.applied.lock().iter().map(|(e, _)| *e).collect()
    }

    /// Data bound by the latest binding applied to `element`.
    pub fn bound_data(&self, element: &Element) -> Option<Value> {
        self.applied
            .lock()
            .iter()
            .rev()
            .find(|(e, _)| e == element)
            .map(|(_, data)| data.snapshot())
    }

    pub fn cleaned(&self) -> Vec<Element> {
        self.cleaned.lock().clone()
    }

    /// Simulate removal of `element`, running its removal hooks.
    ///
    /// Returns how many hooks ran.
    pub fn element_removed(&self, element: &Element) -> usize {
        let hooks = self.removal_hooks.lock().remove(element).unwrap_or_default();
        let count = hooks.len();
        for hook in hooks {
            hook();
        }
        count
    }
}

impl Binder for RecordingBinder {
    fn apply_binding(&self, root: &Element, data: &BoundData) {
        self.applied.lock().push((*root, data.clone()));
    }

    fn clean_binding(&self, root: &Element) {
        self.cleaned.lock().push(*root);
    }

    fn on_element_removed(&self, root: &Element, callback: RemovalCallback) {
        self.removal_hooks
            .lock()
            .entry(*root)
            .or_default()
            .push(callback);
    }
}

/// A fetcher serving fixed content keyed by path.
///
/// Query strings are ignored when looking content up but kept in the
/// recorded URLs.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    content: Arc<Mutex<HashMap<String, String>>>,
    requested: Arc<Mutex<Vec<String>>>,
    gate: Option<Arc<Semaphore>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetcher whose fetches wait until [`open`](Self::open) is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Default::default()
        }
    }

    pub fn with(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        self.content.lock().insert(path.into(), content.into());
    }

    /// Let gated fetches proceed.
    pub fn open(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    /// Let `permits` more gated fetches proceed.
    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    pub fn total_fetches(&self) -> usize {
        self.requested.lock().len()
    }

    /// Fetches of `path`, whatever their query string.
    pub fn fetch_count(&self, path: &str) -> usize {
        self.requested
            .lock()
            .iter()
            .filter(|url| strip_query(url) == path)
            .count()
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, path: &str, _kind: ResourceKind) -> Result<String, String> {
        self.requested.lock().push(path.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire().await.map_err(|e| e.to_string())?.forget();
        }

        self.content
            .lock()
            .get(strip_query(path))
            .cloned()
            .ok_or_else(|| format!("404 Not Found: {}", path))
    }
}
