use core::fmt;
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use surface_bridge_core::SurfaceId;
use tracing::error;
use uuid::Uuid;

/// Lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    SurfaceStarted(SurfaceId),
    /// The first mount of a surface was applied; it is now running.
    SurfaceMounted(SurfaceId),
    WillMountItems(SurfaceId),
    DidMountItems(SurfaceId),
    SurfaceStopping(SurfaceId),
    /// Teardown completed; nothing more will be applied or delivered for this surface.
    SurfaceStopped(SurfaceId),
}

/// Observes surface and mount lifecycle.
///
/// Notifications arrive on whichever thread caused them: starts and stop requests on the caller’s
/// thread, mounts and teardown on the UI thread.
///
/// Listeners must not call back into the [`UiManager`](crate::UiManager) while handling a
/// notification. In particular, [`synchronously_update_view_on_ui_thread`][sync] drains queued
/// UI work in place, so calling it from a mount notification runs later mounts and teardowns
/// before the current one has finished.
///
/// [sync]: crate::UiManager::synchronously_update_view_on_ui_thread
pub trait UiManagerListener: Send + Sync {
    fn on_lifecycle(&self, event: &LifecycleEvent);
}

impl<F> UiManagerListener for F
where
    F: Fn(&LifecycleEvent) + Send + Sync,
{
    fn on_lifecycle(&self, event: &LifecycleEvent) {
        self(event)
    }
}

/// Identifies a registered listener.
///
/// (this is just a UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> ListenerId {
        ListenerId(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Entry = (ListenerId, Arc<dyn UiManagerListener>);

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: RwLock<Arc<Vec<Entry>>>,
}

impl ListenerRegistry {
    pub(crate) fn add(&self, listener: Arc<dyn UiManagerListener>) -> ListenerId {
        let id = ListenerId::new();
        let mut listeners = self.listeners.write();
        let mut next = (**listeners).clone();
        next.push((id, listener));
        *listeners = Arc::new(next);
        id
    }

    /// Returns false if no such listener was registered.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|(entry, _)| *entry == id) {
            return false;
        }
        let next: Vec<Entry> = listeners
            .iter()
            .filter(|(entry, _)| *entry != id)
            .cloned()
            .collect();
        *listeners = Arc::new(next);
        true
    }

    /// Notifies every listener registered when the call began, exactly once.
    pub(crate) fn notify(&self, event: &LifecycleEvent) {
        let snapshot = Arc::clone(&*self.listeners.read());
        for (id, listener) in snapshot.iter() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener.on_lifecycle(event)));
            if delivered.is_err() {
                error!(listener = %id, ?event, "lifecycle listener panicked");
            }
        }
    }
}
