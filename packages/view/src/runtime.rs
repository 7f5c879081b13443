//! The runtime context: one per application.
//!
//! Owns the class registry, the global bus, the resource loader and the
//! registries of named views and stores. Cheap to clone; clones share
//! everything.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::RwLock;

use hearth_core::{
    ClassDefinition, ClassError, ClassRegistry, EventBus, Instance, IntoName, Members, Name,
    ObjectId, Value,
};
use hearth_store::{store_base_definition, Store, StoreConfig, Transport};

use crate::boundary::{Binder, Fetcher, Renderer, ResourceKind, Target};
use crate::config::RuntimeConfig;
use crate::error::{Result, ViewError};
use crate::loader::ResourceLoader;
use crate::view::{
    view_base_definition, SubView, ViewContext, ViewData, ViewHandle, ViewOptions, ViewSettings,
    ViewState, VIEW_BASE_CLASS,
};

/// The boundaries a runtime talks through.
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub renderer: Arc<dyn Renderer>,
    pub binder: Arc<dyn Binder>,
    /// Used by stores for load and submit. Stores without one fail to
    /// reach the network with `NoTransport`.
    pub transport: Option<Arc<dyn Transport>>,
}

struct RuntimeInner {
    config: RuntimeConfig,
    classes: ClassRegistry,
    events: EventBus,
    loader: ResourceLoader,
    context: Arc<ViewContext>,
    transport: Option<Arc<dyn Transport>>,
    views: RwLock<BTreeMap<Name, ViewHandle>>,
    stores: RwLock<BTreeMap<Name, Store>>,
}

/// Shared runtime handle.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

impl Runtime {
    pub fn new(config: RuntimeConfig, collaborators: Collaborators) -> Self {
        let classes = ClassRegistry::new();
        classes.replace(view_base_definition());
        classes.replace(store_base_definition());

        let loader = ResourceLoader::new(collaborators.fetcher, &config);
        tracing::info!(app = %config.app_name, path = %config.app_path, "runtime initialised");

        Self {
            inner: Arc::new(RuntimeInner {
                config,
                classes,
                events: EventBus::global(),
                loader,
                context: Arc::new(ViewContext {
                    renderer: collaborators.renderer,
                    binder: collaborators.binder,
                }),
                transport: collaborators.transport,
                views: RwLock::new(BTreeMap::new()),
                stores: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.inner.classes
    }

    /// The application-wide bus.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn loader(&self) -> &ResourceLoader {
        &self.inner.loader
    }

    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.inner.transport.clone()
    }

    /// Register (or merge into) a class definition.
    pub fn define(&self, definition: ClassDefinition) -> Result<Arc<ClassDefinition>> {
        Ok(self.inner.classes.register(definition)?)
    }

    /// Build and construct an instance of a registered class.
    pub fn instantiate(&self, name: impl IntoName, overrides: Option<Members>) -> Result<Instance> {
        let name = name.into_name().map_err(ClassError::from)?;
        Ok(self.inner.classes.instantiate(&name, overrides)?)
    }

    /// Fetch a resource's raw content through the shared loader.
    pub async fn load_raw(&self, name: &str) -> Result<Arc<str>> {
        self.inner.loader.require(name, ResourceKind::Markup).await
    }

    // ----- views -----

    /// Declare a view without touching its lifecycle.
    ///
    /// The view class is registered on first use as a child of the view
    /// base class. Declaring a name that already has a view returns that
    /// view.
    pub fn declare_view(&self, name: impl IntoName, options: ViewOptions) -> Result<ViewHandle> {
        let name = name.into_name().map_err(ClassError::from)?;
        if let Some(existing) = self.view(&name) {
            return Ok(existing);
        }

        let classes = &self.inner.classes;
        let view_base = Name::from_static(VIEW_BASE_CLASS);
        if !classes.contains(&name) {
            classes.register(ClassDefinition::new(name.clone()).extends(view_base.clone()))?;
        }

        let instance = classes.prepare(&name, options.members.clone())?;
        if !instance.is_a(&view_base) {
            tracing::warn!(view = %name, "view class does not extend {}", VIEW_BASE_CLASS);
        }

        let settings = ViewSettings {
            target: options
                .target
                .or_else(|| instance.get_str("target").map(Target::from)),
            auto_render: options
                .auto_render
                .or_else(|| instance.get("autoRender").and_then(Value::as_bool))
                .unwrap_or(true),
            show_loading: options
                .show_loading
                .or_else(|| instance.get("showLoading").and_then(Value::as_bool))
                .unwrap_or(true),
            loading_template: options
                .loading_template
                .or_else(|| instance.get_str("loadingTpl").map(str::to_string))
                .unwrap_or_else(|| self.inner.config.loading_template.clone()),
            template: options.template,
            sub_views: options.sub_views,
        };

        let store = match options.data {
            Some(ViewData::Store(store)) => store,
            Some(ViewData::Plain(data)) => self.new_store(StoreConfig::with_data(data))?,
            None => self.new_store(StoreConfig::with_data(Value::map()))?,
        };

        let handle = ViewHandle::new(instance, Arc::clone(&self.inner.context), settings, store);
        let mut views = self.inner.views.write();
        Ok(views.entry(name).or_insert(handle).clone())
    }

    /// Declare a view and put it into `Loading`, showing the placeholder.
    pub fn define_view(&self, name: impl IntoName, options: ViewOptions) -> Result<ViewHandle> {
        let view = self.declare_view(name, options)?;
        view.begin_loading();
        Ok(view)
    }

    /// Drive a defined view to content-ready, rendering it when it
    /// auto-renders.
    ///
    /// Runs the instance constructor (firing `constructed`), fetches the
    /// template once, creates the sub-views, then fires `ready`. Concurrent
    /// callers wait for that work to finish, so every caller returns with
    /// the view content-ready. A view that is already content-ready is
    /// only rendered again. When the template fails to load, the
    /// placeholder is dropped and the view stays in `Loading`; calling
    /// again retries once the loader has forgotten the failure.
    pub async fn construct_view(&self, view: &ViewHandle) -> Result<()> {
        self.construct_nested(view, Vec::new()).await
    }

    async fn construct_nested(&self, view: &ViewHandle, ancestors: Vec<ObjectId>) -> Result<()> {
        if view.state() == ViewState::Destroyed {
            return Err(ViewError::ViewDestroyed(view.id()));
        }

        view.construct()?;
        view.begin_loading();
        view.content_cell()
            .get_or_try_init(|| self.load_content(view, ancestors))
            .await?;

        if view.auto_render() {
            self.initial_render(view);
        }
        Ok(())
    }

    async fn load_content(&self, view: &ViewHandle, mut ancestors: Vec<ObjectId>) -> Result<()> {
        let template = match view.inline_template() {
            Some(template) => template,
            None => {
                let name = view.name().to_string();
                match self.inner.loader.require(&name, ResourceKind::Markup).await {
                    Ok(template) => template,
                    Err(e) => {
                        view.abort_loading();
                        return Err(e);
                    }
                }
            }
        };
        view.finish_loading(template);

        ancestors.push(view.id());
        let mut children = Vec::new();
        for sub_view in view.declared_sub_views() {
            let child = match sub_view {
                SubView::Named(name) => {
                    match self.define_view(name, ViewOptions::new().auto_render(false)) {
                        Ok(child) => child,
                        Err(e) => {
                            tracing::warn!(view = %view.name(), error = %e, "unable to create sub-view");
                            continue;
                        }
                    }
                }
                SubView::View(handle) => {
                    handle.begin_loading();
                    handle
                }
            };
            if ancestors.contains(&child.id()) {
                tracing::warn!(view = %view.name(), sub_view = %child.name(), "skipping sub-view that contains its parent");
                continue;
            }
            match self.construct_boxed(&child, ancestors.clone()).await {
                Ok(()) => children.push(child),
                Err(e) => {
                    tracing::warn!(view = %view.name(), error = %e, "unable to create sub-view");
                }
            }
        }
        view.set_sub_views(children);
        view.fire_ready();
        Ok(())
    }

    /// Define and construct a view in one step.
    pub async fn create_view(&self, name: impl IntoName, options: ViewOptions) -> Result<ViewHandle> {
        let view = self.define_view(name, options)?;
        self.construct_view(&view).await?;
        Ok(view)
    }

    fn construct_boxed<'a>(
        &'a self,
        view: &'a ViewHandle,
        ancestors: Vec<ObjectId>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.construct_nested(view, ancestors))
    }

    fn initial_render(&self, view: &ViewHandle) {
        if let Err(e) = view.render() {
            tracing::debug!(view = %view.name(), error = %e, "initial render skipped");
        }
    }

    /// The view registered under `name`.
    pub fn view(&self, name: &Name) -> Option<ViewHandle> {
        self.inner.views.read().get(name).cloned()
    }

    pub fn view_by_id(&self, id: ObjectId) -> Option<ViewHandle> {
        self.inner
            .views
            .read()
            .values()
            .find(|view| view.id() == id)
            .cloned()
    }

    /// All registered views, ordered by name.
    pub fn views(&self) -> Vec<ViewHandle> {
        self.inner.views.read().values().cloned().collect()
    }

    // ----- stores -----

    fn new_store(&self, config: StoreConfig) -> Result<Store> {
        Ok(Store::new(
            &self.inner.classes,
            config,
            self.inner.transport.clone(),
        )?)
    }

    async fn auto_load(&self, store: &Store) {
        if store.auto_load() {
            if let Err(e) = store.load().await {
                tracing::debug!(store = %store.class_name(), error = %e, "auto-load failed");
            }
        }
    }

    /// Create an anonymous store, loading it when it auto-loads.
    pub async fn create_store(&self, config: StoreConfig) -> Result<Store> {
        let store = self.new_store(config)?;
        self.auto_load(&store).await;
        Ok(store)
    }

    /// Create a store from a registered class and register it by name.
    ///
    /// Every call builds a new store; the registry keeps the latest.
    pub async fn create_named_store(
        &self,
        name: impl IntoName,
        overrides: Option<Members>,
    ) -> Result<Store> {
        let name = name.into_name().map_err(ClassError::from)?;
        let store = Store::from_class(
            &self.inner.classes,
            &name,
            overrides,
            self.inner.transport.clone(),
        )?;
        self.inner.stores.write().insert(name, store.clone());
        self.auto_load(&store).await;
        Ok(store)
    }

    pub fn store(&self, name: &Name) -> Option<Store> {
        self.inner.stores.read().get(name).cloned()
    }

    /// Drop every registered view and store and clear the global bus.
    pub fn shutdown(&self) {
        let views = std::mem::take(&mut *self.inner.views.write());
        let stores = std::mem::take(&mut *self.inner.stores.write());
        self.inner.events.clear();
        tracing::info!(views = views.len(), stores = stores.len(), "runtime shut down");
    }
}
