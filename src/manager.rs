use crate::config::BridgeConfig;
use crate::diagnostics::{Counters, Diagnostics};
use crate::dispatcher::{Affinity, Operation, UiDispatcher, UiExecutor};
use crate::error::{BridgeError, InitError, Target};
use crate::events::EventEmitter;
use crate::listeners::{LifecycleEvent, ListenerId, ListenerRegistry, UiManagerListener};
use crate::router::{self, CommandRouter, ViewOp};
use crate::surface::{LifecycleState, Surface, SurfaceRegistry};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use surface_bridge_core::{
    CommandId, Engine, Event, EventSink, MeasureSpec, MountItem, NativeTree, Props, ReactTag,
    RootHandle, RootLayout, SurfaceId, SurfaceStart, TagIndex, Value, ViewManagerRegistry,
};
use tracing::{debug, info, warn};

/// The bridge between the declarative engine and the native view hierarchy.
///
/// A `UiManager` may be cloned and shared with any thread. Operations that touch native views
/// directly must be called on the UI thread (the thread that created the bridge); everything else
/// is queued onto the [`UiExecutor`] returned by [`UiManager::new`].
///
/// Operations return `Err` for anything detectable at the call site. Failures found later, on the
/// UI thread, are logged and end up in [`UiManager::diagnostics`].
#[derive(Clone)]
pub struct UiManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: BridgeConfig,
    dispatcher: UiDispatcher,
    surfaces: SurfaceRegistry,
    view_managers: Arc<ViewManagerRegistry>,
    tags: Arc<TagIndex>,
    router: CommandRouter,
    /// Only locked on the UI thread.
    tree: Mutex<NativeTree>,
    engine: Arc<dyn Engine>,
    emitter: EventEmitter,
    listeners: ListenerRegistry,
    diagnostics: Arc<Diagnostics>,
    counters: Arc<Counters>,
    invalidated: AtomicBool,
}

impl UiManager {
    /// Creates a bridge bound to the current thread, which becomes the UI thread.
    ///
    /// The returned executor must be driven on this thread.
    pub fn new(
        config: BridgeConfig,
        view_managers: Arc<ViewManagerRegistry>,
        engine: Arc<dyn Engine>,
        sink: Arc<dyn EventSink>,
    ) -> Result<(UiManager, UiExecutor), InitError> {
        config.validate()?;

        let diagnostics = Arc::new(Diagnostics::new(config.diagnostics_capacity));
        let counters = Arc::new(Counters::default());
        let emitter = EventEmitter::spawn(
            &config.event_thread_name,
            sink,
            Arc::clone(&diagnostics),
            Arc::clone(&counters),
        )
        .map_err(InitError::EventThread)?;
        let (dispatcher, executor) = UiDispatcher::new();
        let tags = Arc::new(TagIndex::new());

        debug!(strict = config.strict_thread_checks, "creating bridge");
        let inner = Inner {
            surfaces: SurfaceRegistry::new(config.first_surface_id, config.surface_id_step),
            config,
            dispatcher,
            view_managers,
            router: CommandRouter::new(Arc::clone(&tags)),
            tree: Mutex::new(NativeTree::new(Arc::clone(&tags))),
            tags,
            engine,
            emitter,
            listeners: ListenerRegistry::default(),
            diagnostics,
            counters,
            invalidated: AtomicBool::new(false),
        };
        let manager = UiManager {
            inner: Arc::new(inner),
        };
        Ok((manager, executor))
    }

    /// Registers a new surface and asks the engine to start rendering it.
    ///
    /// The surface stays starting until its first mount has been applied.
    pub fn start_surface(
        &self,
        root: RootHandle,
        module_name: &str,
        initial_props: Props,
        width: MeasureSpec,
        height: MeasureSpec,
    ) -> Result<SurfaceId, BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::StartSurface)?;
        let surface = inner
            .surfaces
            .register(
                Some(module_name.to_owned()),
                root,
                RootLayout::new(width, height),
            )
            .map_err(|err| inner.reject(err))?;
        Ok(inner.begin(&surface, initial_props, None))
    }

    /// Starts a surface without a module name or size constraints.
    #[deprecated(note = "use `start_surface`")]
    pub fn add_root_view(
        &self,
        root: RootHandle,
        initial_props: Props,
        initial_ui_template: Option<String>,
    ) -> Result<SurfaceId, BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::AddRootView)?;
        let surface = inner
            .surfaces
            .register(None, root, RootLayout::default())
            .map_err(|err| inner.reject(err))?;
        Ok(inner.begin(&surface, initial_props, initial_ui_template))
    }

    /// Stops a surface.
    ///
    /// The surface stops accepting work immediately. Its native views are released on the UI
    /// thread; from then on no event for it is delivered.
    pub fn stop_surface(&self, surface: SurfaceId) -> Result<(), BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::StopSurface)?;
        let surface = inner.surfaces.begin_stop(surface).map_err(|err| inner.reject(err))?;
        inner.stop(surface, Arc::downgrade(inner));
        Ok(())
    }

    /// Stores new root constraints and asks the engine to re-measure. UI thread only.
    pub fn update_root_layout_specs(
        &self,
        surface: SurfaceId,
        width: MeasureSpec,
        height: MeasureSpec,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<(), BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::UpdateRootLayoutSpecs)?;
        let surface = inner.surfaces.active(surface).map_err(|err| inner.reject(err))?;
        let layout = RootLayout::new(width, height).with_offset(offset_x, offset_y);
        surface.set_layout(layout);
        inner.engine.update_root_layout(surface.id, layout);
        Ok(())
    }

    /// Queues mount items for a surface. They’re applied in order on the UI thread.
    pub fn schedule_mount(
        &self,
        surface: SurfaceId,
        items: Vec<MountItem>,
    ) -> Result<(), BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::ScheduleMount)?;
        let surface = inner.surfaces.active(surface).map_err(|err| inner.reject(err))?;
        let weak = Arc::downgrade(inner);
        inner.dispatcher.post(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.mount(&surface, items);
            }
        }));
        Ok(())
    }

    /// Queues a command for a view.
    ///
    /// `command` is a command name or a legacy integer id.
    pub fn dispatch_command(
        &self,
        tag: ReactTag,
        command: impl Into<CommandId>,
        args: Vec<Value>,
    ) -> Result<(), BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::DispatchCommand)?;
        let command = command.into();
        let (entry, surface) = inner
            .router
            .resolve_target(tag, &inner.surfaces)
            .map_err(|err| inner.reject(err))?;
        let spec = CommandRouter::resolve_command(&entry, tag, &command, &args)
            .map_err(|err| inner.reject(err))?;
        inner.enqueue(surface, tag, ViewOp::Command { spec, args });
        Ok(())
    }

    /// Applies props to a view immediately, bypassing the engine. UI thread only.
    ///
    /// Work already queued for the UI thread runs first. Layout-affecting props are applied as
    /// they are, without a layout pass.
    ///
    /// Must not be called from a [`UiManagerListener`] or a
    /// [`NativeView`](surface_bridge_core::NativeView) callback.
    pub fn synchronously_update_view_on_ui_thread(
        &self,
        tag: ReactTag,
        props: Props,
    ) -> Result<(), BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::SynchronouslyUpdateView)?;
        if inner.config.warn_on_layout_props {
            if let Some(key) = router::layout_prop(&props) {
                warn!(
                    %tag,
                    prop = key,
                    "synchronous update of a layout prop won’t re-run layout"
                );
            }
        }
        inner.dispatcher.flush();

        let (_, surface) = inner
            .router
            .resolve_target(tag, &inner.surfaces)
            .map_err(|err| inner.reject(err))?;
        inner.apply(&surface, tag, ViewOp::Props(props))
    }

    pub fn send_accessibility_event(
        &self,
        tag: ReactTag,
        event_type: i32,
    ) -> Result<(), BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::SendAccessibilityEvent)?;
        let (_, surface) = inner
            .router
            .resolve_target(tag, &inner.surfaces)
            .map_err(|err| inner.reject(err))?;
        inner.enqueue(surface, tag, ViewOp::Accessibility(event_type));
        Ok(())
    }

    /// Forwards a native event to the engine.
    ///
    /// Events may still be sent while a surface is stopping; they’re dropped if its teardown
    /// completes first.
    pub fn receive_event(
        &self,
        surface: SurfaceId,
        tag: ReactTag,
        event_name: &str,
        payload: Option<Props>,
    ) -> Result<(), BridgeError> {
        let inner = &self.inner;
        inner.enter(Operation::ReceiveEvent)?;
        let event = Event::new(surface, tag, event_name, payload.unwrap_or_default());
        let target = if surface == SurfaceId::IMPLICIT {
            None
        } else {
            let live = inner
                .surfaces
                .get(surface)
                .filter(|surface| surface.state() != LifecycleState::Stopped)
                .ok_or_else(|| inner.reject(BridgeError::StaleTarget(Target::Surface(surface))))?;
            Some(live)
        };
        if !inner.emitter.emit(event, target) {
            return Err(inner.reject(BridgeError::Invalidated));
        }
        Ok(())
    }

    /// Forwards a native event that doesn’t name its surface.
    #[deprecated(note = "use `receive_event`")]
    pub fn receive_event_legacy(
        &self,
        tag: ReactTag,
        event_name: &str,
        payload: Option<Props>,
    ) -> Result<(), BridgeError> {
        self.receive_event(SurfaceId::IMPLICIT, tag, event_name, payload)
    }

    /// Maps a native event name to the name the engine’s direct-event handlers use.
    ///
    /// Names exported by view managers win; otherwise `topFoo` maps to `onFoo`.
    #[deprecated(note = "view managers should export their direct event names")]
    pub fn resolve_custom_direct_event_name(&self, event_name: Option<&str>) -> Option<String> {
        self.inner.counters.call(Operation::ResolveDirectEventName);
        let event_name = event_name?;
        let catalog = self.inner.view_managers.snapshot();
        if let Some(mapped) = catalog.direct_event_name(event_name) {
            return Some(mapped.to_owned());
        }
        event_name
            .strip_prefix("top")
            .filter(|rest| !rest.is_empty())
            .map(|rest| format!("on{}", rest))
    }

    pub fn add_ui_manager_event_listener(
        &self,
        listener: Arc<dyn UiManagerListener>,
    ) -> Result<ListenerId, BridgeError> {
        self.inner.enter(Operation::AddListener)?;
        Ok(self.inner.listeners.add(listener))
    }

    /// Returns false if the listener wasn’t registered.
    pub fn remove_ui_manager_event_listener(&self, id: ListenerId) -> bool {
        self.inner.counters.call(Operation::RemoveListener);
        self.inner.listeners.remove(id)
    }

    /// Warms up the named view managers. Returns how many succeeded.
    ///
    /// Failures are only logged.
    #[deprecated(note = "view managers are initialized on first use")]
    pub fn pre_initialize_view_managers<I, S>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.inner.enter(Operation::PreInitializeViewManagers).is_err() {
            return 0;
        }
        let catalog = self.inner.view_managers.snapshot();
        let mut ready = 0;
        for name in names {
            let name = name.as_ref();
            let Some(manager) = catalog.get(name) else {
                debug!(view_manager = name, "no such view manager to pre-initialize");
                continue;
            };
            match panic::catch_unwind(AssertUnwindSafe(|| manager.pre_initialize())) {
                Ok(Ok(())) => {
                    debug!(view_manager = name, "pre-initialized");
                    ready += 1;
                }
                Ok(Err(err)) => {
                    debug!(view_manager = name, error = %err, "pre-initialization failed")
                }
                Err(_) => debug!(view_manager = name, "pre-initialization panicked"),
            }
        }
        ready
    }

    /// Per-operation call counts and a few totals.
    pub fn performance_counters(&self) -> BTreeMap<String, u64> {
        self.inner.counters.snapshot()
    }

    /// Stops every live surface and shuts the bridge down.
    ///
    /// Teardown still runs on the UI executor. Every later operation fails with
    /// [`BridgeError::Invalidated`].
    pub fn invalidate(&self) {
        let inner = &self.inner;
        inner.counters.call(Operation::Invalidate);
        if inner.invalidated.swap(true, Ordering::AcqRel) {
            return;
        }
        let live = inner.surfaces.live_ids();
        info!(surfaces = live.len(), "invalidating bridge");
        for id in live {
            if let Ok(surface) = inner.surfaces.begin_stop(id) {
                inner.stop(surface, Arc::downgrade(inner));
            }
        }
    }

    /// Recent error records, oldest first.
    pub fn diagnostics(&self) -> Vec<BridgeError> {
        self.inner.diagnostics.snapshot()
    }

    /// Like [`UiManager::diagnostics`], but clears the records.
    pub fn take_diagnostics(&self) -> Vec<BridgeError> {
        self.inner.diagnostics.take()
    }

    pub fn surface_state(&self, surface: SurfaceId) -> LifecycleState {
        self.inner.surfaces.state(surface)
    }

    pub fn root_layout(&self, surface: SurfaceId) -> Option<RootLayout> {
        self.inner.surfaces.get(surface).map(|surface| surface.layout())
    }

    pub fn root_view(&self, surface: SurfaceId) -> Option<RootHandle> {
        self.inner.surfaces.get(surface).map(|surface| surface.root.clone())
    }

    /// Ids of surfaces whose teardown hasn’t completed, in ascending order.
    pub fn live_surfaces(&self) -> Vec<SurfaceId> {
        self.inner.surfaces.live_ids()
    }

    /// Whether a view with this tag is currently mounted.
    pub fn is_mounted(&self, tag: ReactTag) -> bool {
        self.inner.tags.contains(tag)
    }

    pub fn view_managers(&self) -> &Arc<ViewManagerRegistry> {
        &self.inner.view_managers
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }
}

impl Inner {
    /// Counts the call and checks that it may run here.
    fn enter(&self, operation: Operation) -> Result<(), BridgeError> {
        self.counters.call(operation);
        if self.invalidated.load(Ordering::Acquire) {
            return Err(self.reject(BridgeError::Invalidated));
        }
        if operation.affinity() == Affinity::UiThread && !self.dispatcher.is_ui_thread() {
            let err = self.reject(BridgeError::ThreadViolation { operation });
            if self.config.strict_thread_checks {
                panic!("{}", err);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Records a dropped operation.
    fn reject(&self, err: BridgeError) -> BridgeError {
        Counters::bump(&self.counters.dropped);
        self.diagnostics.report(&err);
        err
    }

    fn begin(
        &self,
        surface: &Surface,
        initial_props: Props,
        initial_ui_template: Option<String>,
    ) -> SurfaceId {
        info!(surface = %surface.id, module = ?surface.module_name, "starting surface");
        self.listeners
            .notify(&LifecycleEvent::SurfaceStarted(surface.id));
        self.engine.start_surface(SurfaceStart {
            surface: surface.id,
            module_name: surface.module_name.clone(),
            initial_props,
            layout: surface.layout(),
            initial_ui_template,
            root: surface.root.clone(),
        });
        surface.id
    }

    /// Continues a stop after the surface has moved to stopping.
    fn stop(&self, surface: Arc<Surface>, this: Weak<Inner>) {
        info!(surface = %surface.id, "stopping surface");
        self.listeners
            .notify(&LifecycleEvent::SurfaceStopping(surface.id));
        self.engine.stop_surface(surface.id);
        self.dispatcher.post(Box::new(move || {
            if let Some(inner) = this.upgrade() {
                inner.tear_down(&surface);
            }
        }));
    }

    fn tear_down(&self, surface: &Surface) {
        let released = self.tree.lock().remove_surface(surface.id);
        self.surfaces.finish_stop(surface);
        info!(surface = %surface.id, released, "surface stopped");
        self.listeners
            .notify(&LifecycleEvent::SurfaceStopped(surface.id));
    }

    fn mount(&self, surface: &Surface, items: Vec<MountItem>) {
        if !surface.state().accepts_work() {
            self.reject(BridgeError::StaleTarget(Target::Surface(surface.id)));
            return;
        }
        self.listeners
            .notify(&LifecycleEvent::WillMountItems(surface.id));
        let catalog = self.view_managers.snapshot();
        {
            let mut tree = self.tree.lock();
            for item in items {
                match tree.patch(surface.id, item, &catalog) {
                    Ok(()) => Counters::bump(&self.counters.mount_items),
                    Err(err) => {
                        self.reject(err.into());
                    }
                }
            }
        }
        if self.surfaces.mark_running(surface) {
            info!(surface = %surface.id, "surface mounted");
            self.listeners
                .notify(&LifecycleEvent::SurfaceMounted(surface.id));
        }
        self.listeners
            .notify(&LifecycleEvent::DidMountItems(surface.id));
    }

    /// Queues a view operation for the UI thread.
    fn enqueue(self: &Arc<Self>, surface: Arc<Surface>, tag: ReactTag, op: ViewOp) {
        let weak = Arc::downgrade(self);
        self.dispatcher.post(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                // already reported
                let _ = inner.apply(&surface, tag, op);
            }
        }));
    }

    /// Applies a view operation. UI thread only.
    fn apply(&self, surface: &Surface, tag: ReactTag, op: ViewOp) -> Result<(), BridgeError> {
        let result = CommandRouter::apply(&mut self.tree.lock(), surface, tag, op);
        match result {
            Ok(()) => {
                Counters::bump(&self.counters.views_updated);
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }
}
