#![allow(dead_code)]

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use surface_bridge::*;

/// Something a recording view was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Created(ReactTag),
    Props(ReactTag, Props),
    Command(ReactTag, String, Vec<Value>),
    Accessibility(ReactTag, i32),
}

pub type Log = Arc<Mutex<Vec<Applied>>>;

#[derive(Debug)]
pub struct RecordingView {
    tag: ReactTag,
    log: Log,
}

impl NativeView for RecordingView {
    fn update_props(&mut self, props: &Props) -> Result<(), ViewManagerError> {
        if props.contains_key("explode") {
            panic!("view {} exploded", self.tag);
        }
        self.log.lock().push(Applied::Props(self.tag, props.clone()));
        Ok(())
    }

    fn receive_command(
        &mut self,
        command: &CommandSpec,
        args: &[Value],
    ) -> Result<(), ViewManagerError> {
        if command.name() == "crash" {
            panic!("native crash");
        }
        self.log.lock().push(Applied::Command(
            self.tag,
            command.name().to_owned(),
            args.to_vec(),
        ));
        Ok(())
    }

    fn send_accessibility_event(&mut self, event_type: i32) -> Result<(), ViewManagerError> {
        self.log.lock().push(Applied::Accessibility(self.tag, event_type));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A `ScrollView` manager whose views record everything.
pub struct RecordingManager {
    commands: CommandTable,
    pub log: Log,
}

impl RecordingManager {
    pub fn new() -> RecordingManager {
        let commands = CommandTable::new()
            .with(
                CommandSpec::new("scrollTo")
                    .legacy_id(1)
                    .args([ArgKind::Number, ArgKind::Number]),
            )
            .with(CommandSpec::new("flashScrollIndicators").legacy_id(2))
            .with(CommandSpec::new("crash"));
        RecordingManager {
            commands,
            log: Log::default(),
        }
    }
}

impl ViewManager for RecordingManager {
    fn name(&self) -> &str {
        "ScrollView"
    }

    fn commands(&self) -> &CommandTable {
        &self.commands
    }

    fn create_view(
        &self,
        tag: ReactTag,
        _props: &Props,
    ) -> Result<Box<dyn NativeView>, ViewManagerError> {
        self.log.lock().push(Applied::Created(tag));
        Ok(Box::new(RecordingView {
            tag,
            log: Arc::clone(&self.log),
        }))
    }

    fn direct_event_names(&self) -> Vec<(String, String)> {
        vec![("topMomentumScrollEnd".into(), "onMomentumScrollEnded".into())]
    }
}

/// A manager that can’t be warmed up.
pub struct Unwarmable {
    pub panics: bool,
    commands: CommandTable,
}

impl Unwarmable {
    pub fn new(panics: bool) -> Unwarmable {
        Unwarmable {
            panics,
            commands: CommandTable::new(),
        }
    }
}

impl ViewManager for Unwarmable {
    fn name(&self) -> &str {
        if self.panics {
            "Panicky"
        } else {
            "Broken"
        }
    }

    fn commands(&self) -> &CommandTable {
        &self.commands
    }

    fn create_view(
        &self,
        _: ReactTag,
        _: &Props,
    ) -> Result<Box<dyn NativeView>, ViewManagerError> {
        Err(ViewManagerError::new("not available"))
    }

    fn pre_initialize(&self) -> Result<(), ViewManagerError> {
        if self.panics {
            panic!("warmup panicked");
        }
        Err(ViewManagerError::new("warmup failed"))
    }
}

/// What the engine was told.
#[derive(Debug, Clone)]
pub enum EngineCall {
    Start(SurfaceStart),
    Layout(SurfaceId, RootLayout),
    Stop(SurfaceId),
}

#[derive(Default)]
pub struct RecordingEngine {
    pub calls: Mutex<Vec<EngineCall>>,
}

impl Engine for RecordingEngine {
    fn start_surface(&self, start: SurfaceStart) {
        self.calls.lock().push(EngineCall::Start(start));
    }

    fn update_root_layout(&self, surface: SurfaceId, layout: RootLayout) {
        self.calls.lock().push(EngineCall::Layout(surface, layout));
    }

    fn stop_surface(&self, surface: SurfaceId) {
        self.calls.lock().push(EngineCall::Stop(surface));
    }
}

/// Forwards events to a channel. Delivery blocks while `hold` is locked.
pub struct ChannelSink {
    sender: Sender<Event>,
    hold: Arc<Mutex<()>>,
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: Event) {
        let _hold = self.hold.lock();
        let _ = self.sender.send(event);
    }
}

pub struct NullSink;

impl EventSink for NullSink {
    fn deliver(&self, _: Event) {}
}

pub struct Harness {
    pub manager: UiManager,
    pub executor: UiExecutor,
    pub engine: Arc<RecordingEngine>,
    pub events: Receiver<Event>,
    pub hold: Arc<Mutex<()>>,
    pub log: Log,
}

impl Harness {
    pub fn new() -> Harness {
        Harness::with_config(BridgeConfig {
            strict_thread_checks: false,
            ..BridgeConfig::default()
        })
    }

    pub fn with_config(config: BridgeConfig) -> Harness {
        let registry = Arc::new(ViewManagerRegistry::new());
        let scroll_views = RecordingManager::new();
        let log = Arc::clone(&scroll_views.log);
        registry.register(Arc::new(scroll_views));
        registry.register(Arc::new(Unwarmable::new(false)));
        registry.register(Arc::new(Unwarmable::new(true)));

        let engine = Arc::new(RecordingEngine::default());
        let (sender, events) = channel::unbounded();
        let hold = Arc::new(Mutex::new(()));
        let (manager, executor) = UiManager::new(
            config,
            registry,
            Arc::clone(&engine) as Arc<dyn Engine>,
            Arc::new(ChannelSink {
                sender,
                hold: Arc::clone(&hold),
            }),
        )
        .unwrap();
        Harness {
            manager,
            executor,
            engine,
            events,
            hold,
            log,
        }
    }

    pub fn start(&self) -> SurfaceId {
        self.manager
            .start_surface(
                RootHandle::new("root"),
                "App",
                Props::new(),
                MeasureSpec::exactly(1080),
                MeasureSpec::exactly(1920),
            )
            .unwrap()
    }

    /// Starts a surface and mounts one scroll view per tag under its root.
    pub fn start_with_views(&self, tags: &[i32]) -> SurfaceId {
        let surface = self.start();
        let mut items = Vec::new();
        for (index, tag) in tags.iter().enumerate() {
            items.push(MountItem::Create {
                tag: ReactTag(*tag),
                view_manager: "ScrollView".into(),
                props: Props::new(),
            });
            items.push(MountItem::Insert {
                parent: None,
                child: ReactTag(*tag),
                index,
            });
        }
        self.manager.schedule_mount(surface, items).unwrap();
        self.executor.run_pending();
        self.log.lock().clear();
        surface
    }

    /// Entries logged by views, excluding creation.
    pub fn applied(&self) -> Vec<Applied> {
        self.log
            .lock()
            .iter()
            .filter(|entry| !matches!(entry, Applied::Created(_)))
            .cloned()
            .collect()
    }

    pub fn next_event(&self) -> Option<Event> {
        self.events.recv_timeout(Duration::from_secs(5)).ok()
    }
}

pub fn props(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

pub fn scroll_args(y: i64) -> Vec<Value> {
    vec![json!(0), json!(y)]
}
