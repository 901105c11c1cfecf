use std::{
    sync::mpsc::{sync_channel, SyncSender, TrySendError},
    thread::JoinHandle,
};

use crate::{Error, Event, EventTransport, Result};

/// Default number of events that may wait for delivery before new ones are dropped.
pub(crate) const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Background thread delivering events produced by decisions.
///
/// Decisions hand events over through a bounded channel and return immediately. The thread
/// delivers them one by one in the order they were dispatched. When the queue is full, new
/// events are dropped.
pub(crate) struct EventDispatcher {
    join_handle: JoinHandle<()>,
    sender: SyncSender<Event>,
}

impl EventDispatcher {
    pub fn start(
        transport: Box<dyn EventTransport + Send + Sync>,
        capacity: usize,
    ) -> Result<EventDispatcher> {
        // A zero capacity would make every `try_send` fail unless the thread is idle.
        let (sender, receiver) = sync_channel::<Event>(capacity.max(1));

        let join_handle = std::thread::Builder::new()
            .name("vwo-events".to_owned())
            .spawn(move || {
                // Loop ends once every sender is dropped and the queue is drained.
                for event in receiver {
                    log::trace!(target: "vwo",
                                endpoint = event.endpoint(),
                                user_id = event.user_id();
                                "delivering event");
                    if let Err(err) = transport.deliver(&event) {
                        log::warn!(target: "vwo",
                                   endpoint = event.endpoint(),
                                   user_id = event.user_id();
                                   "failed to deliver event: {err}");
                    }
                }
                log::debug!(target: "vwo", "event dispatcher stopped");
            })?;

        Ok(EventDispatcher {
            join_handle,
            sender,
        })
    }

    /// Queue `event` for delivery. Never blocks. Returns `false` if the event was dropped.
    pub fn dispatch(&self, event: Event) -> bool {
        log::trace!(target: "vwo", endpoint = event.endpoint(); "queueing event");
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::warn!(target: "vwo",
                           endpoint = event.endpoint(),
                           user_id = event.user_id();
                           "event queue is full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                // The receiving thread is gone, there's nobody left to deliver to.
                log::warn!(target: "vwo", "event dispatcher is not running, dropping event");
                false
            }
        }
    }

    /// Stop accepting events and block until every queued event has been delivered.
    pub fn shutdown(self) -> Result<()> {
        drop(self.sender);
        self.join_handle
            .join()
            .map_err(|_| Error::DispatcherThreadPanicked)
    }
}
