//! The surface registry and lifecycle state machine.

use crate::error::{BridgeError, Target};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;
use surface_bridge_core::{RootHandle, RootLayout, SurfaceId};

/// Lifecycle of a surface. States only ever move forward.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// No surface with this id exists (yet).
    Unregistered = 0,
    /// Registered; waiting for the first mount.
    Starting = 1,
    Running = 2,
    /// Stop requested; teardown is queued on the UI thread.
    Stopping = 3,
    Stopped = 4,
}

impl LifecycleState {
    fn from_u8(value: u8) -> LifecycleState {
        match value {
            1 => LifecycleState::Starting,
            2 => LifecycleState::Running,
            3 => LifecycleState::Stopping,
            4 => LifecycleState::Stopped,
            _ => LifecycleState::Unregistered,
        }
    }

    /// Whether commands and mounts for the surface may still be applied.
    pub fn accepts_work(self) -> bool {
        matches!(self, LifecycleState::Starting | LifecycleState::Running)
    }
}

/// A registered surface.
pub(crate) struct Surface {
    pub(crate) id: SurfaceId,
    pub(crate) module_name: Option<String>,
    pub(crate) root: RootHandle,
    state: AtomicU8,
    layout: Mutex<RootLayout>,
    /// Held while delivering an event and while completing teardown.
    gate: Mutex<()>,
}

impl Surface {
    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn advance(&self, from: LifecycleState, to: LifecycleState) -> bool {
        debug_assert!(from < to, "lifecycle may not move backwards");
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn layout(&self) -> RootLayout {
        *self.layout.lock()
    }

    pub(crate) fn set_layout(&self, layout: RootLayout) {
        *self.layout.lock() = layout;
    }

    /// Runs `f` unless teardown has completed. Teardown waits for a running `f` to finish.
    pub(crate) fn while_live<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.gate.lock();
        if self.state() == LifecycleState::Stopped {
            None
        } else {
            Some(f())
        }
    }
}

/// Tracks live surfaces.
///
/// Ids are handed out from `first_id` in increments of `step` and never wrap, so an id that was
/// handed out and is no longer live has been stopped.
pub(crate) struct SurfaceRegistry {
    first_id: i32,
    step: i32,
    /// Past `i32::MAX` once ids run out.
    next_id: AtomicI64,
    live: RwLock<HashMap<SurfaceId, Arc<Surface>>>,
}

impl SurfaceRegistry {
    pub(crate) fn new(first_id: i32, step: i32) -> SurfaceRegistry {
        SurfaceRegistry {
            first_id,
            step,
            next_id: AtomicI64::new(i64::from(first_id)),
            live: RwLock::new(HashMap::new()),
        }
    }

    fn allocate(&self) -> Result<SurfaceId, BridgeError> {
        let step = i64::from(self.step);
        let id = self
            .next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                i32::try_from(next).ok().and(next.checked_add(step))
            })
            .map_err(|_| BridgeError::IdsExhausted)?;
        i32::try_from(id)
            .map(SurfaceId)
            .map_err(|_| BridgeError::IdsExhausted)
    }

    /// Whether `id` was handed out and has since been stopped.
    fn is_retired(&self, id: SurfaceId) -> bool {
        let raw = i64::from(id.0);
        let first = i64::from(self.first_id);
        raw >= first
            && (raw - first) % i64::from(self.step) == 0
            && raw < self.next_id.load(Ordering::Relaxed)
            && !self.live.read().contains_key(&id)
    }

    /// Allocates an id and registers a new surface in the starting state.
    pub(crate) fn register(
        &self,
        module_name: Option<String>,
        root: RootHandle,
        layout: RootLayout,
    ) -> Result<Arc<Surface>, BridgeError> {
        let id = self.allocate()?;
        let surface = Arc::new(Surface {
            id,
            module_name,
            root,
            state: AtomicU8::new(LifecycleState::Starting as u8),
            layout: Mutex::new(layout),
            gate: Mutex::new(()),
        });
        self.live.write().insert(id, Arc::clone(&surface));
        Ok(surface)
    }

    pub(crate) fn get(&self, id: SurfaceId) -> Option<Arc<Surface>> {
        self.live.read().get(&id).cloned()
    }

    /// Looks up a surface that still accepts work.
    pub(crate) fn active(&self, id: SurfaceId) -> Result<Arc<Surface>, BridgeError> {
        self.get(id)
            .filter(|surface| surface.state().accepts_work())
            .ok_or(BridgeError::StaleTarget(Target::Surface(id)))
    }

    pub(crate) fn state(&self, id: SurfaceId) -> LifecycleState {
        match self.get(id) {
            Some(surface) => surface.state(),
            None if self.is_retired(id) => LifecycleState::Stopped,
            None => LifecycleState::Unregistered,
        }
    }

    /// Moves a starting surface to running. Returns false if it wasn’t starting.
    pub(crate) fn mark_running(&self, surface: &Surface) -> bool {
        surface.advance(LifecycleState::Starting, LifecycleState::Running)
    }

    /// Moves a surface to stopping.
    pub(crate) fn begin_stop(&self, id: SurfaceId) -> Result<Arc<Surface>, BridgeError> {
        let surface = match self.get(id) {
            Some(surface) => surface,
            None if self.is_retired(id) => return Err(BridgeError::DoubleTeardown(id)),
            None => return Err(BridgeError::StaleTarget(Target::Surface(id))),
        };
        loop {
            let current = surface.state();
            if !current.accepts_work() {
                return Err(BridgeError::DoubleTeardown(id));
            }
            if surface.advance(current, LifecycleState::Stopping) {
                return Ok(surface);
            }
        }
    }

    /// Completes teardown and forgets the surface.
    pub(crate) fn finish_stop(&self, surface: &Surface) {
        {
            let _gate = surface.gate.lock();
            surface
                .state
                .store(LifecycleState::Stopped as u8, Ordering::Release);
        }
        self.live.write().remove(&surface.id);
    }

    pub(crate) fn live_ids(&self) -> Vec<SurfaceId> {
        let mut ids: Vec<_> = self.live.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
