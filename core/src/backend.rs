//! Traits for the collaborators on either side of the bridge.

use crate::command::{CommandSpec, CommandTable};
use crate::event::Event;
use crate::ids::{ReactTag, SurfaceId};
use crate::value::{Props, RootLayout, Value};
use core::any::Any;
use core::fmt;
use std::sync::Arc;
use thiserror::Error;

/// An opaque reference to a host-owned root view.
///
/// The bridge never looks inside; hosts can get their view back with [`RootHandle::downcast_ref`].
#[derive(Clone)]
pub struct RootHandle(Arc<dyn Any + Send + Sync>);

impl RootHandle {
    pub fn new<T: Any + Send + Sync>(view: T) -> RootHandle {
        RootHandle(Arc::new(view))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Returns true if both handles refer to the same root view.
    pub fn ptr_eq(&self, other: &RootHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RootHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("RootHandle(..)")
    }
}

/// Errors reported by view managers and native views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewManagerError {
    #[error("{0}")]
    Failed(String),
    #[error("native view panicked: {0}")]
    Panicked(String),
}

impl ViewManagerError {
    pub fn new(message: impl Into<String>) -> ViewManagerError {
        ViewManagerError::Failed(message.into())
    }
}

/// Constructs and describes one type of native view.
pub trait ViewManager: Send + Sync {
    /// The name mount items use to refer to this view manager.
    fn name(&self) -> &str;

    /// Commands understood by this manager’s views.
    fn commands(&self) -> &CommandTable;

    /// Creates a new native view.
    fn create_view(
        &self,
        tag: ReactTag,
        props: &Props,
    ) -> Result<Box<dyn NativeView>, ViewManagerError>;

    /// Native event names this manager dispatches as direct events, mapped to the name the
    /// declarative engine knows them by.
    fn direct_event_names(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Eagerly builds anything that would otherwise be built on first use.
    fn pre_initialize(&self) -> Result<(), ViewManagerError> {
        Ok(())
    }
}

/// A native view.
///
/// Native views are only ever touched on the UI thread. They must not call back into the bridge
/// while handling one of these methods.
pub trait NativeView: fmt::Debug + Send {
    /// Applies a property diff.
    fn update_props(&mut self, props: &Props) -> Result<(), ViewManagerError>;

    /// Runs a command that has already been validated against `command`.
    fn receive_command(
        &mut self,
        command: &CommandSpec,
        args: &[Value],
    ) -> Result<(), ViewManagerError>;

    fn send_accessibility_event(&mut self, event_type: i32) -> Result<(), ViewManagerError> {
        let _ = event_type;
        Ok(())
    }

    /// Attaches a child view at `index`.
    fn insert_child(
        &mut self,
        index: usize,
        child: &dyn NativeView,
    ) -> Result<(), ViewManagerError> {
        let _ = (index, child);
        Ok(())
    }

    /// Detaches the child view at `index`.
    fn remove_child(
        &mut self,
        index: usize,
        child: &dyn NativeView,
    ) -> Result<(), ViewManagerError> {
        let _ = (index, child);
        Ok(())
    }

    /// For downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Everything the engine needs to start rendering a surface.
#[derive(Debug, Clone)]
pub struct SurfaceStart {
    pub surface: SurfaceId,
    pub module_name: Option<String>,
    pub initial_props: Props,
    pub layout: RootLayout,
    pub initial_ui_template: Option<String>,
    pub root: RootHandle,
}

/// The declarative engine.
///
/// Calls are notifications; implementations schedule their work and return.
pub trait Engine: Send + Sync {
    /// Begins layout and mounting for a new surface.
    fn start_surface(&self, start: SurfaceStart);

    /// Re-measures a surface root with new constraints.
    fn update_root_layout(&self, surface: SurfaceId, layout: RootLayout);

    /// Stops a surface. The native hierarchy has already been detached by the host.
    fn stop_surface(&self, surface: SurfaceId);
}

/// Transport for events headed to the declarative engine.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: Event);
}
