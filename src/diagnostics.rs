use crate::dispatcher::Operation;
use crate::error::BridgeError;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, warn};

/// A bounded ring of recent error records.
pub(crate) struct Diagnostics {
    capacity: usize,
    records: Mutex<VecDeque<BridgeError>>,
}

impl Diagnostics {
    pub(crate) fn new(capacity: usize) -> Diagnostics {
        Diagnostics {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Logs an error and keeps a record of it.
    pub(crate) fn report(&self, err: &BridgeError) {
        if err.is_fatal() {
            error!(error = %err, "thread confinement violated");
        } else {
            warn!(error = %err, "operation dropped");
        }
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(err.clone());
    }

    pub(crate) fn snapshot(&self) -> Vec<BridgeError> {
        self.records.lock().iter().cloned().collect()
    }

    pub(crate) fn take(&self) -> Vec<BridgeError> {
        self.records.lock().drain(..).collect()
    }
}

/// Performance counters.
#[derive(Default)]
pub(crate) struct Counters {
    calls: [AtomicU64; Operation::COUNT],
    pub(crate) dropped: AtomicU64,
    pub(crate) views_updated: AtomicU64,
    pub(crate) mount_items: AtomicU64,
    pub(crate) events_delivered: AtomicU64,
}

impl Counters {
    pub(crate) fn call(&self, operation: Operation) {
        self.calls[operation.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, u64> {
        let mut counters: BTreeMap<String, u64> = Operation::ALL
            .iter()
            .map(|op| {
                let calls = self.calls[op.index()].load(Ordering::Relaxed);
                (format!("calls.{}", op.name()), calls)
            })
            .collect();
        for (name, counter) in [
            ("dropped", &self.dropped),
            ("views_updated", &self.views_updated),
            ("mount_items", &self.mount_items),
            ("events_delivered", &self.events_delivered),
        ] {
            counters.insert(name.to_owned(), counter.load(Ordering::Relaxed));
        }
        counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Target;
    use surface_bridge_core::SurfaceId;

    #[test]
    fn ring_keeps_the_newest_records() {
        let diagnostics = Diagnostics::new(2);
        for id in 1..=3 {
            diagnostics.report(&BridgeError::DoubleTeardown(SurfaceId(id)));
        }
        assert_eq!(
            diagnostics.take(),
            vec![
                BridgeError::DoubleTeardown(SurfaceId(2)),
                BridgeError::DoubleTeardown(SurfaceId(3)),
            ]
        );
        assert!(diagnostics.snapshot().is_empty());
    }

    #[test]
    fn zero_capacity_only_logs() {
        let diagnostics = Diagnostics::new(0);
        diagnostics.report(&BridgeError::StaleTarget(Target::Surface(SurfaceId(1))));
        assert!(diagnostics.snapshot().is_empty());
    }

    #[test]
    fn counters_cover_every_operation() {
        let counters = Counters::default();
        counters.call(Operation::DispatchCommand);
        counters.call(Operation::DispatchCommand);
        Counters::bump(&counters.dropped);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot["calls.dispatch_command"], 2);
        assert_eq!(snapshot["calls.start_surface"], 0);
        assert_eq!(snapshot["dropped"], 1);
        assert_eq!(snapshot.len(), Operation::COUNT + 4);
    }
}
