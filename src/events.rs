//! Outbound events.
//!
//! Events are queued from any thread and handed to the [`EventSink`] by a single delivery thread,
//! in the order they were received. A surface’s teardown and the delivery of its events share a
//! gate, so once teardown completes no further event for that surface reaches the sink.

use crate::diagnostics::{Counters, Diagnostics};
use crate::error::{BridgeError, Target};
use crate::surface::Surface;
use crossbeam::channel::{self, Receiver, Sender};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use surface_bridge_core::{Event, EventSink};
use tracing::{debug, error};

struct Pending {
    event: Event,
    /// `None` for the implicit surface, which is never torn down.
    surface: Option<Arc<Surface>>,
}

pub(crate) struct EventEmitter {
    queue: Sender<Pending>,
}

impl EventEmitter {
    /// Starts the delivery thread. It exits once the emitter is dropped and the queue is drained.
    pub(crate) fn spawn(
        thread_name: &str,
        sink: Arc<dyn EventSink>,
        diagnostics: Arc<Diagnostics>,
        counters: Arc<Counters>,
    ) -> io::Result<EventEmitter> {
        let (queue, pending) = channel::unbounded();
        thread::Builder::new()
            .name(thread_name.to_owned())
            .spawn(move || deliver_all(pending, &*sink, &diagnostics, &counters))?;
        Ok(EventEmitter { queue })
    }

    /// Queues an event. Returns false if the delivery thread is gone.
    pub(crate) fn emit(&self, event: Event, surface: Option<Arc<Surface>>) -> bool {
        self.queue.send(Pending { event, surface }).is_ok()
    }
}

fn deliver_all(
    pending: Receiver<Pending>,
    sink: &dyn EventSink,
    diagnostics: &Diagnostics,
    counters: &Counters,
) {
    for Pending { event, surface } in pending.iter() {
        let surface_id = event.surface;
        let tag = event.tag;
        let deliver = || {
            if panic::catch_unwind(AssertUnwindSafe(|| sink.deliver(event))).is_err() {
                error!(surface = %surface_id, %tag, "event sink panicked");
            }
        };
        let delivered = match surface {
            Some(surface) => surface.while_live(deliver).is_some(),
            None => {
                deliver();
                true
            }
        };
        if delivered {
            Counters::bump(&counters.events_delivered);
        } else {
            Counters::bump(&counters.dropped);
            diagnostics.report(&BridgeError::StaleTarget(Target::Surface(surface_id)));
        }
    }
    debug!("event queue closed");
}
