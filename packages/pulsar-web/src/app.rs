//! Application root and bootstrap.
//!
//! A root owns everything one mounted Pulsar application needs: the element
//! registry, the id context, the event delegator, the mutation-observer
//! node watcher and the reactive root. One application root at a time is
//! *current*; element construction and lifecycle hooks that do not receive
//! the root explicitly go through the current one.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pulsar_reactive::{create_root, RootHandle};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::*;

/// Errors raised while building or mounting an application.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// [`AppRootBuilder::root`] was never called.
    #[error("no mount root was configured")]
    MissingRoot,
    /// The root selector matched nothing.
    #[error("no element matches root selector `{0}`")]
    RootNotFound(String),
    /// [`AppRoot::mount`] was called on an already mounted root.
    #[error("application is already mounted")]
    AlreadyMounted,
    /// There is no global `document` (not running in a browser context).
    #[error("document is not available")]
    DocumentUnavailable,
}

/// The global document, or the error a builder/mount path should surface
/// when there is none.
fn try_document() -> Result<web_sys::Document, ConfigError> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or(ConfigError::DocumentUnavailable)
}

/// The mount target of an application.
pub enum RootTarget {
    /// Resolved with `querySelector` at build time.
    Selector(String),
    /// A DOM element held directly.
    Element(web_sys::Element),
}

impl From<&str> for RootTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}
impl From<String> for RootTarget {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}
impl From<web_sys::Element> for RootTarget {
    fn from(element: web_sys::Element) -> Self {
        Self::Element(element)
    }
}

type MountCallback = Box<dyn FnMut(&web_sys::Node)>;
type UnmountCallback = Box<dyn FnMut()>;
type ErrorCallback = Rc<dyn Fn(&RenderError)>;

pub(crate) struct AppRootInner {
    pub root_element: web_sys::Element,
    pub registry: ElementRegistry,
    pub id_context: IdContext,
    pub delegator: EventDelegator,
    pub portal_stack: RefCell<Vec<String>>,
    watcher: RefCell<Option<NodeWatcher>>,
    scope: RefCell<Option<RootHandle>>,
    mounted: Cell<bool>,
    on_mount: RefCell<Option<MountCallback>>,
    on_unmount: RefCell<Option<UnmountCallback>>,
    on_error: RefCell<Option<ErrorCallback>>,
    services: Option<Rc<dyn Any>>,
    #[allow(dead_code)]
    settings: Option<Rc<dyn Any>>,
    #[allow(dead_code)]
    state_manager: Option<Rc<dyn Any>>,
}

thread_local! {
    static CURRENT_APP: RefCell<Option<Rc<AppRootInner>>> = const { RefCell::new(None) };
}

/// The current application root's internals, if an application is mounted.
pub(crate) fn current_app() -> Option<Rc<AppRootInner>> {
    CURRENT_APP.with(|app| app.borrow().clone())
}

/// Builder for an [`AppRoot`]. Obtained from [`bootstrap_app`].
#[derive(Default)]
pub struct AppRootBuilder {
    root: Option<RootTarget>,
    on_mount: Option<MountCallback>,
    on_unmount: Option<UnmountCallback>,
    on_error: Option<ErrorCallback>,
    services: Option<Rc<dyn Any>>,
    settings: Option<Rc<dyn Any>>,
    state_manager: Option<Rc<dyn Any>>,
}

/// Start building an application root.
///
/// ```no_run
/// # use pulsar_web::*;
/// let app = bootstrap_app()
///     .root("#app")
///     .on_mount(|_| console_log!("mounted"))
///     .build()
///     .unwrap();
/// ```
pub fn bootstrap_app() -> AppRootBuilder {
    AppRootBuilder::default()
}

impl AppRootBuilder {
    /// Set the mount target: a CSS selector or an element. Required.
    pub fn root(mut self, target: impl Into<RootTarget>) -> Self {
        self.root = Some(target.into());
        self
    }

    /// Called after a successful mount with the mounted node.
    pub fn on_mount(mut self, cb: impl FnMut(&web_sys::Node) + 'static) -> Self {
        self.on_mount = Some(Box::new(cb));
        self
    }

    /// Called before teardown.
    pub fn on_unmount(mut self, cb: impl FnMut() + 'static) -> Self {
        self.on_unmount = Some(Box::new(cb));
        self
    }

    /// Called on mount/runtime errors not caught by an error boundary.
    pub fn on_error(mut self, cb: impl Fn(&RenderError) + 'static) -> Self {
        self.on_error = Some(Rc::new(cb));
        self
    }

    /// Attach an opaque service container, retrievable with
    /// [`use_service`].
    pub fn services(mut self, services: Rc<dyn Any>) -> Self {
        self.services = Some(services);
        self
    }

    /// Attach opaque application settings. Passed through for user code.
    pub fn settings(mut self, settings: Rc<dyn Any>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Attach an opaque state manager. Passed through for user code.
    pub fn state_manager(mut self, state_manager: Rc<dyn Any>) -> Self {
        self.state_manager = Some(state_manager);
        self
    }

    /// Resolve the mount target and assemble the root.
    pub fn build(self) -> Result<AppRoot, ConfigError> {
        let root_element = match self.root.ok_or(ConfigError::MissingRoot)? {
            RootTarget::Element(element) => element,
            RootTarget::Selector(selector) => try_document()?
                .query_selector(&selector)
                .ok()
                .flatten()
                .ok_or(ConfigError::RootNotFound(selector))?,
        };

        let delegator = EventDelegator::new(root_element.clone());
        Ok(AppRoot {
            inner: Rc::new(AppRootInner {
                root_element,
                registry: ElementRegistry::new(),
                id_context: IdContext::new(),
                delegator,
                portal_stack: RefCell::new(Vec::new()),
                watcher: RefCell::new(None),
                scope: RefCell::new(None),
                mounted: Cell::new(false),
                on_mount: RefCell::new(self.on_mount),
                on_unmount: RefCell::new(self.on_unmount),
                on_error: RefCell::new(self.on_error),
                services: self.services,
                settings: self.settings,
                state_manager: self.state_manager,
            }),
        })
    }
}

/// A built application root. Cloning is cheap and refers to the same root.
#[derive(Clone)]
pub struct AppRoot {
    inner: Rc<AppRootInner>,
}

impl AppRoot {
    /// Mount `component` into the root element.
    ///
    /// If the document is still loading, mounting is deferred until
    /// `DOMContentLoaded` and `Ok(())` is returned immediately.
    pub fn mount(&self, component: impl FnOnce() -> View + 'static) -> Result<(), ConfigError> {
        if self.inner.mounted.get() {
            let err = ConfigError::AlreadyMounted;
            self.report(&RenderError::Message(err.to_string()));
            return Err(err);
        }

        let document = match try_document() {
            Ok(document) => document,
            Err(err) => {
                self.report(&RenderError::Message(err.to_string()));
                return Err(err);
            }
        };
        if document.ready_state() == "loading" {
            let app = self.clone();
            let cb = Closure::once_into_js(move || {
                let _ = app.mount_now(component);
            });
            document
                .add_event_listener_with_callback("DOMContentLoaded", cb.unchecked_ref())
                .unwrap_throw();
            return Ok(());
        }

        self.mount_now(component)
    }

    fn mount_now(&self, component: impl FnOnce() -> View + 'static) -> Result<(), ConfigError> {
        let inner = &self.inner;

        // Clear whatever was server-rendered or left over. Elements that
        // opt in to hydration are adopted before this point, so the
        // component closure runs against a clean root.
        let root_node: web_sys::Node = inner.root_element.clone().into();

        CURRENT_APP.with(|app| *app.borrow_mut() = Some(Rc::clone(inner)));

        let root_element = inner.root_element.clone();
        let handle = create_root(move || {
            let view = component();
            crate::utils::clear_children(&root_element);
            // Mark the component's root node in the registry.
            if let Some(app) = current_app() {
                if let Some(id) = view.as_single_node().and_then(crate::utils::element_id_of) {
                    if let Some(mut entry) = app.registry.get(&id) {
                        entry.kind = ElementKind::Component;
                        app.registry.register(id, entry);
                    }
                }
            }
            view.append_to(&root_element);
        });
        *inner.scope.borrow_mut() = Some(handle);

        *inner.watcher.borrow_mut() = Some(NodeWatcher::attach(&inner.root_element));
        inner.mounted.set(true);

        if let Some(cb) = inner.on_mount.borrow_mut().as_mut() {
            cb(&root_node);
        }
        Ok(())
    }

    /// Tear the application down: dispose the reactive root (cascading all
    /// cleanups), clear the registry, disconnect the watcher, destroy the
    /// delegator, empty the root element and run `on_unmount`.
    ///
    /// Unmounting an application that is not mounted does nothing.
    pub fn unmount(&self) {
        let inner = &self.inner;
        if !inner.mounted.replace(false) {
            return;
        }

        if let Some(scope) = inner.scope.borrow_mut().take() {
            scope.dispose();
        }
        inner.registry.clear();
        inner.id_context.reset();
        if let Some(watcher) = inner.watcher.borrow_mut().take() {
            watcher.disconnect();
        }
        inner.delegator.destroy();
        inner.portal_stack.borrow_mut().clear();

        CURRENT_APP.with(|app| {
            let mut app = app.borrow_mut();
            if app
                .as_ref()
                .is_some_and(|current| Rc::ptr_eq(current, inner))
            {
                *app = None;
            }
        });

        inner.root_element.set_inner_html("");

        if let Some(cb) = inner.on_unmount.borrow_mut().as_mut() {
            cb();
        }
    }

    /// Whether the application is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    /// The root element the application renders into.
    pub fn root_element(&self) -> &web_sys::Element {
        &self.inner.root_element
    }

    fn report(&self, error: &RenderError) {
        if let Some(cb) = self.inner.on_error.borrow().as_ref() {
            cb(error);
        } else {
            console_error!("{error}");
        }
    }
}

/// Create and mount an application in one call.
///
/// Shorthand for `bootstrap_app().root(target).build()` followed by
/// [`AppRoot::mount`].
pub fn pulse(
    component: impl FnOnce() -> View + 'static,
    target: impl Into<RootTarget>,
) -> Result<AppRoot, ConfigError> {
    let app = bootstrap_app().root(target).build()?;
    app.mount(component)?;
    Ok(app)
}

/// Retrieve the service container attached to the current application root
/// with [`AppRootBuilder::services`], downcast to `T`.
pub fn use_service<T: 'static>() -> Option<Rc<T>> {
    let services = current_app()?.services.clone()?;
    services.downcast::<T>().ok()
}

/// Run `f` with a read-only borrow of the current application's element
/// registry. Returns `None` when no application is mounted. Intended for
/// dev tooling and tests; do not mutate DOM based on what you read here.
pub fn with_current_registry<T>(f: impl FnOnce(&ElementRegistry) -> T) -> Option<T> {
    Some(f(&current_app()?.registry))
}

/// Run `f` with `id` as the current parent for hierarchical id generation.
/// Falls through to a plain call when no application is mounted or no id is
/// available.
pub(crate) fn with_id_scope<T>(id: Option<&str>, f: impl FnOnce() -> T) -> T {
    match (current_app(), id) {
        (Some(app), Some(id)) => app.id_context.run_scoped(id, f),
        _ => f(),
    }
}

/// Route an error to the current application root's `on_error` callback, or
/// to the console if none is installed. Used for runtime errors that no
/// error boundary caught.
pub fn report_error(error: &RenderError) {
    if let Some(app) = current_app() {
        if let Some(cb) = app.on_error.borrow().as_ref() {
            cb(error);
            return;
        }
    }
    console_error!("{error}");
}
