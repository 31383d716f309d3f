//! Coordinates surfaces, commands and events between a declarative engine and a native view
//! hierarchy confined to one UI thread.
//!
//! # Conceptual overview
//! The declarative engine runs on background threads. It starts and stops *surfaces*, schedules
//! mount items, and sends imperative commands to views. Native views may only be touched on the
//! UI thread. A [`UiManager`] sits in between: every entry point knows which thread it may run
//! on, and anything that needs the UI thread from elsewhere is queued onto a [`UiExecutor`].
//!
//! ## Threads
//! The thread that creates a [`UiManager`] is the UI thread. It gets a [`UiExecutor`], which
//! can’t be sent anywhere else, and drains it from its UI loop. A few operations (like
//! [`UiManager::synchronously_update_view_on_ui_thread`]) run in place and must be called on the
//! UI thread. Calling them elsewhere is a [`BridgeError::ThreadViolation`], which panics if
//! [`BridgeConfig::strict_thread_checks`] is on.
//!
//! Queued work runs in the order it was queued, so commands to the same view apply in order.
//!
//! ## Surface lifecycle
//! Surfaces go through [`LifecycleState`]s in one direction only:
//!
//! ```text
//! Unregistered → Starting → Running → Stopping → Stopped
//! ```
//!
//! A surface becomes running when its first mount is applied. Once stopping, it accepts no more
//! commands or mounts; anything for it still in the queue is dropped. Teardown happens on the UI
//! thread, and after it completes no event for the surface reaches the [`EventSink`].
//!
//! ## Failures
//! Nothing the engine sends can crash the UI thread. Stale tags, unknown commands and failing
//! native views are logged with `tracing`, counted, and recorded in a small diagnostics ring.
//!
//! # Examples
//! ```no_run
//! # use std::sync::Arc;
//! # use surface_bridge::*;
//! # fn run(
//! #     engine: Arc<dyn Engine>,
//! #     sink: Arc<dyn EventSink>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ViewManagerRegistry::new());
//! let (manager, executor) = UiManager::new(BridgeConfig::default(), registry, engine, sink)?;
//!
//! let surface = manager.start_surface(
//!     RootHandle::new("root view"),
//!     "App",
//!     Props::new(),
//!     MeasureSpec::exactly(1080),
//!     MeasureSpec::at_most(1920),
//! )?;
//! executor.run_pending();
//! manager.stop_surface(surface)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod diagnostics;
mod dispatcher;
mod error;
mod events;
mod listeners;
mod manager;
mod router;
mod surface;

pub use config::{BridgeConfig, ConfigError};
pub use dispatcher::{Affinity, Operation, UiExecutor};
pub use error::{BridgeError, InitError, Target};
pub use listeners::{LifecycleEvent, ListenerId, UiManagerListener};
pub use manager::UiManager;
pub use surface::LifecycleState;
pub use surface_bridge_core::*;
