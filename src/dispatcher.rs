//! Thread confinement.
//!
//! One thread, the UI thread, may touch native views. The bridge binds to the thread it’s created
//! on and hands back a [`UiExecutor`] that can’t leave it. Work from other threads is queued onto
//! the executor; UI-only entry points check that they’re already on the UI thread.

use core::fmt;
use core::marker::PhantomData;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, ThreadId};
use std::time::Duration;
use tracing::trace;

/// Where an operation may be called from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affinity {
    AnyThread,
    UiThread,
}

/// Every entry point of the bridge, tagged with its thread affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddRootView,
    StartSurface,
    StopSurface,
    UpdateRootLayoutSpecs,
    ScheduleMount,
    DispatchCommand,
    SynchronouslyUpdateView,
    SendAccessibilityEvent,
    ReceiveEvent,
    ResolveDirectEventName,
    AddListener,
    RemoveListener,
    PreInitializeViewManagers,
    Invalidate,
}

impl Operation {
    pub const COUNT: usize = 14;

    pub const ALL: [Operation; Operation::COUNT] = [
        Operation::AddRootView,
        Operation::StartSurface,
        Operation::StopSurface,
        Operation::UpdateRootLayoutSpecs,
        Operation::ScheduleMount,
        Operation::DispatchCommand,
        Operation::SynchronouslyUpdateView,
        Operation::SendAccessibilityEvent,
        Operation::ReceiveEvent,
        Operation::ResolveDirectEventName,
        Operation::AddListener,
        Operation::RemoveListener,
        Operation::PreInitializeViewManagers,
        Operation::Invalidate,
    ];

    pub fn affinity(self) -> Affinity {
        match self {
            Operation::AddRootView
            | Operation::UpdateRootLayoutSpecs
            | Operation::SynchronouslyUpdateView => Affinity::UiThread,
            _ => Affinity::AnyThread,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::AddRootView => "add_root_view",
            Operation::StartSurface => "start_surface",
            Operation::StopSurface => "stop_surface",
            Operation::UpdateRootLayoutSpecs => "update_root_layout_specs",
            Operation::ScheduleMount => "schedule_mount",
            Operation::DispatchCommand => "dispatch_command",
            Operation::SynchronouslyUpdateView => "synchronously_update_view_on_ui_thread",
            Operation::SendAccessibilityEvent => "send_accessibility_event",
            Operation::ReceiveEvent => "receive_event",
            Operation::ResolveDirectEventName => "resolve_custom_direct_event_name",
            Operation::AddListener => "add_ui_manager_event_listener",
            Operation::RemoveListener => "remove_ui_manager_event_listener",
            Operation::PreInitializeViewManagers => "pre_initialize_view_managers",
            Operation::Invalidate => "invalidate",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) type UiTask = Box<dyn FnOnce() + Send>;

type SomeUnsendType = *mut ();

/// Runs queued UI work.
///
/// Must stay on the thread that created the bridge; it is deliberately neither `Send` nor `Sync`.
/// The host drives it from its UI loop with [`UiExecutor::run_pending`], or hands the whole
/// thread over with [`UiExecutor::run`].
pub struct UiExecutor {
    tasks: Receiver<UiTask>,
    _unsend: PhantomData<SomeUnsendType>,
}

impl UiExecutor {
    /// Runs every task queued so far. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        drain(&self.tasks)
    }

    /// Waits up to `timeout` for work, then runs everything queued.
    pub fn run_timeout(&self, timeout: Duration) -> usize {
        match self.tasks.recv_timeout(timeout) {
            Ok(task) => {
                task();
                1 + drain(&self.tasks)
            }
            Err(_) => 0,
        }
    }

    /// Runs tasks until the bridge is dropped.
    pub fn run(self) {
        for task in self.tasks.iter() {
            task();
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

impl fmt::Debug for UiExecutor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("UiExecutor")
            .field("pending", &self.tasks.len())
            .finish()
    }
}

/// The sending side of the UI queue, plus the identity of the UI thread.
pub(crate) struct UiDispatcher {
    sender: Sender<UiTask>,
    queued: Receiver<UiTask>,
    ui_thread: ThreadId,
}

impl UiDispatcher {
    /// Binds to the current thread.
    pub(crate) fn new() -> (UiDispatcher, UiExecutor) {
        let (sender, tasks) = channel::unbounded();
        let dispatcher = UiDispatcher {
            sender,
            queued: tasks.clone(),
            ui_thread: thread::current().id(),
        };
        let executor = UiExecutor {
            tasks,
            _unsend: PhantomData,
        };
        (dispatcher, executor)
    }

    pub(crate) fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    /// Queues a task for the UI thread.
    pub(crate) fn post(&self, task: UiTask) {
        // we hold a receiver ourselves, so the channel can’t be disconnected
        if self.sender.send(task).is_err() {
            trace!("UI queue disconnected");
        }
    }

    /// Runs already-queued tasks in place. Only valid on the UI thread.
    pub(crate) fn flush(&self) -> usize {
        debug_assert!(self.is_ui_thread(), "flush called off the UI thread");
        drain(&self.queued)
    }
}

fn drain(tasks: &Receiver<UiTask>) -> usize {
    let mut count = 0;
    loop {
        match tasks.try_recv() {
            Ok(task) => {
                task();
                count += 1;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn tasks_run_in_post_order() {
        let (dispatcher, executor) = UiDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let log = Arc::clone(&log);
            dispatcher.post(Box::new(move || log.lock().push(i)));
        }
        assert_eq!(executor.pending(), 5);
        assert_eq!(executor.run_pending(), 5);
        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn only_the_creating_thread_is_the_ui_thread() {
        let (dispatcher, _executor) = UiDispatcher::new();
        assert!(dispatcher.is_ui_thread());
        let dispatcher = Arc::new(dispatcher);
        let remote = Arc::clone(&dispatcher);
        let off_thread = thread::spawn(move || remote.is_ui_thread()).join().unwrap();
        assert!(!off_thread);
    }

    #[test]
    fn affinities() {
        let ui_only: Vec<_> = Operation::ALL
            .iter()
            .filter(|op| op.affinity() == Affinity::UiThread)
            .map(|op| op.name())
            .collect();
        assert_eq!(
            ui_only,
            vec![
                "add_root_view",
                "update_root_layout_specs",
                "synchronously_update_view_on_ui_thread"
            ]
        );
        for (i, op) in Operation::ALL.iter().enumerate() {
            assert_eq!(op.index(), i);
        }
    }
}
