//! The View Object and its render lifecycle.
//!
//! A view moves through `Initial → Loading → Rendered → Destroyed` and
//! never back. `Loading` is entered when the view is defined, `Rendered`
//! on its first successful render and `Destroyed` when the element its
//! data is bound to is removed.
//!
//! Construction is split in two phases, each with its own local signal:
//! `constructed` fires once the instance constructor has run, `ready` once
//! the template has arrived and the sub-views exist. The two are not
//! ordered with respect to anything else the application does.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OnceCell;

use hearth_core::{
    ClassDefinition, ClassError, EventBus, Instance, Members, Name, ObjectId, Value, BASE_CLASS,
    READY_EVENT_FIELD,
};
use hearth_store::{BoundData, Store};

use crate::boundary::{Binder, Element, Renderer, Target};
use crate::error::{Result, ViewError};

/// Name of the built-in view class.
pub const VIEW_BASE_CLASS: &str = "hearth.view.Base";

/// Channels fired on a view's own bus.
pub mod signal {
    /// The instance constructor has run.
    pub const CONSTRUCTED: &str = "constructed";
    /// Template loaded and sub-views created.
    pub const READY: &str = "ready";
    /// Markup was injected into the target.
    pub const RENDERED: &str = "rendered";
    /// The bound element was removed.
    pub const DESTROYED: &str = "destroyed";
    /// The lifecycle state changed; payload is the new state's name.
    pub const STATE: &str = "state";
}

/// The built-in view class.
///
/// Its ready event is `constructed`, leaving `ready` for the second phase.
pub fn view_base_definition() -> ClassDefinition {
    ClassDefinition::new(Name::from_static(VIEW_BASE_CLASS))
        .extends(Name::from_static(BASE_CLASS))
        .field(READY_EVENT_FIELD, signal::CONSTRUCTED)
        .field("autoRender", true)
        .field("showLoading", true)
        .field("target", Value::Null)
}

/// Lifecycle state of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    Initial,
    Loading,
    Rendered,
    Destroyed,
}

impl ViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewState::Initial => "initial",
            ViewState::Loading => "loading",
            ViewState::Rendered => "rendered",
            ViewState::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data given to a view: plain data to wrap, or a store to share.
#[derive(Debug, Clone)]
pub enum ViewData {
    Plain(Value),
    Store(Store),
}

impl From<Value> for ViewData {
    fn from(value: Value) -> Self {
        ViewData::Plain(value)
    }
}

impl From<Store> for ViewData {
    fn from(store: Store) -> Self {
        ViewData::Store(store)
    }
}

/// A nested view reference.
#[derive(Clone)]
pub enum SubView {
    /// A view to create by name, without auto-rendering.
    Named(Name),
    /// An existing view; constructed if still in its initial state.
    View(ViewHandle),
}

impl From<Name> for SubView {
    fn from(name: Name) -> Self {
        SubView::Named(name)
    }
}

impl From<ViewHandle> for SubView {
    fn from(view: ViewHandle) -> Self {
        SubView::View(view)
    }
}

/// Options for declaring a view.
///
/// Unset options fall back to the class fields `target`, `autoRender`,
/// `showLoading` and `loadingTpl`, then to the defaults.
#[derive(Clone, Default)]
pub struct ViewOptions {
    pub target: Option<Target>,
    pub data: Option<ViewData>,
    /// Inline template; skips the fetch.
    pub template: Option<String>,
    pub auto_render: Option<bool>,
    pub show_loading: Option<bool>,
    pub loading_template: Option<String>,
    pub sub_views: Vec<SubView>,
    /// Members composed over the view class for this view only.
    pub members: Option<Members>,
}

impl ViewOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn data(mut self, data: impl Into<ViewData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn auto_render(mut self, auto_render: bool) -> Self {
        self.auto_render = Some(auto_render);
        self
    }

    pub fn show_loading(mut self, show_loading: bool) -> Self {
        self.show_loading = Some(show_loading);
        self
    }

    pub fn loading_template(mut self, markup: impl Into<String>) -> Self {
        self.loading_template = Some(markup.into());
        self
    }

    pub fn sub_view(mut self, sub_view: impl Into<SubView>) -> Self {
        self.sub_views.push(sub_view.into());
        self
    }

    pub fn members(mut self, members: Members) -> Self {
        self.members = Some(members);
        self
    }
}

/// Renderer and binder shared by every view of a runtime.
pub(crate) struct ViewContext {
    pub(crate) renderer: Arc<dyn Renderer>,
    pub(crate) binder: Arc<dyn Binder>,
}

/// Settings resolved when a view is declared.
pub(crate) struct ViewSettings {
    pub(crate) target: Option<Target>,
    pub(crate) auto_render: bool,
    pub(crate) show_loading: bool,
    pub(crate) loading_template: String,
    pub(crate) template: Option<String>,
    pub(crate) sub_views: Vec<SubView>,
}

type Signals = Vec<(&'static str, Vec<Value>)>;

struct View {
    id: ObjectId,
    name: Name,
    context: Arc<ViewContext>,
    state: ViewState,
    target: Option<Target>,
    auto_render: bool,
    show_loading: bool,
    loading_template: String,
    inline_template: Option<Arc<str>>,
    template: Option<Arc<str>>,
    html: String,
    store: Store,
    loader: Option<Element>,
    rendered_into: Option<Element>,
    declared_sub_views: Vec<SubView>,
    sub_views: Vec<ViewHandle>,
    content_ready: bool,
}

impl View {
    fn resolve_target(&self) -> Option<Element> {
        self.target
            .as_ref()
            .and_then(|t| self.context.renderer.resolve_target(t))
    }

    fn set_state(&mut self, state: ViewState, signals: &mut Signals) {
        if self.state != state {
            tracing::debug!(view = %self.name, from = %self.state, to = %state, "view state");
            self.state = state;
            signals.push((signal::STATE, vec![Value::from(state.as_str())]));
        }
    }

    fn start_loader(&mut self) {
        if !self.show_loading || self.loader.is_some() {
            return;
        }
        let Some(target) = self.resolve_target() else {
            return;
        };
        let renderer = &self.context.renderer;
        renderer.hide(&target);
        let markup = format!("<div id='hb-loader-{}'>{}</div>", self.id, self.loading_template);
        self.loader = renderer.insert_placeholder(&target, &markup);
    }

    fn stop_loader(&mut self) {
        if let Some(placeholder) = self.loader.take() {
            self.context.renderer.remove(&placeholder);
            if let Some(target) = self.resolve_target() {
                self.context.renderer.show(&target);
            }
        }
    }

    fn render(&mut self, this: &Weak<Shared>, signals: &mut Signals) -> Result<bool> {
        if self.state == ViewState::Destroyed {
            return Err(ViewError::ViewDestroyed(self.id));
        }
        if !self.content_ready {
            tracing::warn!(view = %self.name, "unable to render, template not loaded yet");
            return Err(ViewError::ContentNotReady {
                view: self.name.to_string(),
            });
        }

        let Some(target) = self.resolve_target() else {
            let described = self
                .target
                .as_ref()
                .map_or_else(|| "<none>".to_string(), Target::to_string);
            tracing::warn!(view = %self.name, target = %described, "unable to render, no target found");
            return Err(ViewError::RenderTargetNotFound {
                view: self.name.to_string(),
                target: described,
            });
        };

        let renderer = Arc::clone(&self.context.renderer);
        let binder = Arc::clone(&self.context.binder);

        match renderer.bound_view(&target) {
            Some(bound) if bound == self.id => return Ok(false),
            Some(other) => {
                tracing::debug!(view = %self.name, previous = %other, "cleaning previous binding");
                binder.clean_binding(&target);
                renderer.set_bound_view(&target, None);
            }
            None if self.state == ViewState::Rendered && self.rendered_into == Some(target) => {
                return Ok(false);
            }
            None => {}
        }

        renderer.render_into(&target, &self.html);
        self.stop_loader();
        self.rendered_into = Some(target);
        self.set_state(ViewState::Rendered, signals);

        if let Some(data) = self.store.data().filter(|d| !d.is_empty()) {
            renderer.set_bound_view(&target, Some(self.id));
            binder.apply_binding(&target, &data);
            let this = Weak::clone(this);
            binder.on_element_removed(
                &target,
                Box::new(move || {
                    if let Some(shared) = this.upgrade() {
                        ViewHandle { shared }.element_removed(target);
                    }
                }),
            );
        }

        signals.push((signal::RENDERED, vec![Value::from(self.id.to_string())]));
        Ok(true)
    }
}

struct Shared {
    id: ObjectId,
    name: Name,
    events: EventBus,
    instance: Mutex<Instance>,
    view: Mutex<View>,
    content: OnceCell<()>,
}

/// Shared handle to a view.
///
/// Signals, and events the class instance fires while running its
/// constructor or an operation, are published on the view's own bus after
/// the internal locks are released, so listeners may call back into the
/// handle.
#[derive(Clone)]
pub struct ViewHandle {
    shared: Arc<Shared>,
}

impl ViewHandle {
    pub(crate) fn new(
        instance: Instance,
        context: Arc<ViewContext>,
        settings: ViewSettings,
        store: Store,
    ) -> Self {
        let id = instance.id();
        let name = instance.class_name().clone();
        let events = instance.events().clone();
        let inline_template = settings.template.map(Arc::from);
        let view = View {
            id,
            name: name.clone(),
            context,
            state: ViewState::Initial,
            target: settings.target,
            auto_render: settings.auto_render,
            show_loading: settings.show_loading,
            loading_template: settings.loading_template,
            template: None,
            inline_template,
            html: String::new(),
            store,
            loader: None,
            rendered_into: None,
            declared_sub_views: settings.sub_views,
            sub_views: Vec::new(),
            content_ready: false,
        };
        Self {
            shared: Arc::new(Shared {
                id,
                name,
                events,
                instance: Mutex::new(instance),
                view: Mutex::new(view),
                content: OnceCell::new(),
            }),
        }
    }

    fn fire(&self, signals: Signals) {
        for (channel, args) in signals {
            self.shared.events.publish(channel, &args);
        }
    }

    /// Run `f` on the instance, publishing what it fires once unlocked.
    fn with_instance<T>(&self, f: impl FnOnce(&mut Instance) -> T) -> T {
        let (result, fired) = {
            let mut instance = self.shared.instance.lock();
            instance.defer_events();
            let result = f(&mut instance);
            (result, instance.take_deferred())
        };
        for (channel, args) in fired {
            self.shared.events.publish(&channel, &args);
        }
        result
    }

    pub fn id(&self) -> ObjectId {
        self.shared.id
    }

    pub fn name(&self) -> &Name {
        &self.shared.name
    }

    /// The view's own event bus.
    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn same_view(&self, other: &ViewHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn state(&self) -> ViewState {
        self.shared.view.lock().state
    }

    pub fn is_constructed(&self) -> bool {
        self.shared.instance.lock().is_constructed()
    }

    /// Whether the template has arrived and sub-views were created.
    pub fn is_content_ready(&self) -> bool {
        self.shared.view.lock().content_ready
    }

    pub fn auto_render(&self) -> bool {
        self.shared.view.lock().auto_render
    }

    pub fn template(&self) -> Option<Arc<str>> {
        self.shared.view.lock().template.clone()
    }

    /// Markup rendered into the target.
    pub fn html(&self) -> String {
        self.shared.view.lock().html.clone()
    }

    pub fn store(&self) -> Store {
        self.shared.view.lock().store.clone()
    }

    /// The store's bound data, if any.
    pub fn data(&self) -> Option<BoundData> {
        self.store().data()
    }

    pub fn target(&self) -> Option<Target> {
        self.shared.view.lock().target.clone()
    }

    /// Point the view at another target; the next render uses it.
    pub fn set_target(&self, target: impl Into<Target>) {
        self.shared.view.lock().target = Some(target.into());
    }

    /// Element the view last rendered into.
    pub fn rendered_into(&self) -> Option<Element> {
        self.shared.view.lock().rendered_into
    }

    pub fn sub_views(&self) -> Vec<ViewHandle> {
        self.shared.view.lock().sub_views.clone()
    }

    /// Read a field of the view's class instance.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.shared.instance.lock().get(field).cloned()
    }

    /// Invoke an operation of the view's class.
    pub fn call(&self, operation: &str, args: &[Value]) -> std::result::Result<Value, ClassError> {
        self.with_instance(|instance| instance.call(operation, args))
    }

    /// Render into the target.
    ///
    /// Fails with [`ViewError::ContentNotReady`] until the template has
    /// arrived. Returns `Ok(false)` when nothing had to be done: the target already
    /// carries this view's binding, or the view is already rendered into
    /// it. A binding left on the target by another view is cleaned first.
    pub fn render(&self) -> Result<bool> {
        let mut signals = Signals::new();
        let weak = Arc::downgrade(&self.shared);
        let result = self.shared.view.lock().render(&weak, &mut signals);
        self.fire(signals);
        result
    }

    pub fn show(&self) {
        let view = self.shared.view.lock();
        if let Some(target) = view.resolve_target() {
            view.context.renderer.show(&target);
        }
    }

    pub fn hide(&self) {
        let view = self.shared.view.lock();
        if let Some(target) = view.resolve_target() {
            view.context.renderer.hide(&target);
        }
    }

    /// Visibility of the target; `false` when it does not resolve.
    pub fn is_visible(&self) -> bool {
        let view = self.shared.view.lock();
        view.resolve_target()
            .is_some_and(|target| view.context.renderer.is_visible(&target))
    }

    /// Merge new data into the view's store.
    pub fn update(&self, data: impl Into<Value>) -> Result<BoundData> {
        Ok(self.store().set_data(data.into())?)
    }

    pub(crate) fn construct(&self) -> Result<bool> {
        Ok(self.with_instance(Instance::construct)?)
    }

    /// Guards the one-time template load and sub-view creation.
    pub(crate) fn content_cell(&self) -> &OnceCell<()> {
        &self.shared.content
    }

    /// Enter `Loading` and show the placeholder. No-op after `Initial`.
    pub(crate) fn begin_loading(&self) {
        let mut signals = Signals::new();
        {
            let mut view = self.shared.view.lock();
            if view.state == ViewState::Initial {
                view.set_state(ViewState::Loading, &mut signals);
            }
            if view.state == ViewState::Loading {
                view.start_loader();
            }
        }
        self.fire(signals);
    }

    /// A load failed: drop the placeholder, stay in `Loading`.
    pub(crate) fn abort_loading(&self) {
        self.shared.view.lock().stop_loader();
    }

    pub(crate) fn inline_template(&self) -> Option<Arc<str>> {
        self.shared.view.lock().inline_template.clone()
    }

    /// Store the template; the view can render from now on.
    pub(crate) fn finish_loading(&self, template: Arc<str>) {
        let mut view = self.shared.view.lock();
        view.html = template.to_string();
        view.template = Some(template);
        view.content_ready = true;
    }

    pub(crate) fn declared_sub_views(&self) -> Vec<SubView> {
        self.shared.view.lock().declared_sub_views.clone()
    }

    pub(crate) fn set_sub_views(&self, sub_views: Vec<ViewHandle>) {
        self.shared.view.lock().sub_views = sub_views;
    }

    pub(crate) fn fire_ready(&self) {
        self.shared
            .events
            .publish(signal::READY, &[Value::from(self.id().to_string())]);
    }

    fn element_removed(&self, element: Element) {
        let mut signals = Signals::new();
        {
            let mut view = self.shared.view.lock();
            if view.state == ViewState::Destroyed || view.rendered_into != Some(element) {
                return;
            }
            view.rendered_into = None;
            view.set_state(ViewState::Destroyed, &mut signals);
            signals.push((
                signal::DESTROYED,
                vec![Value::Integer(element.as_u64() as i64)],
            ));
        }
        tracing::debug!(view = %self.shared.name, %element, "view destroyed");
        self.fire(signals);
    }
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHandle")
            .field("name", &self.shared.name.to_string())
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}
