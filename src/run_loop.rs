//! Single-threaded event loop and channel-keyed dispatch
//!
//! Bus handlers never touch process state directly. They post into the loop's
//! bounded inbox, and the loop hands events to one callback at a time, so no
//! two handlers ever run concurrently and none re-enters another.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::bus::{Notification, NotificationBus, NotificationHandler};
use crate::error::Result;

/// Posts events into a `RunLoop` from any thread
pub struct LoopSender<E> {
    tx: Sender<E>,
}

impl<E> Clone for LoopSender<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> LoopSender<E> {
    /// Queue an event without blocking. A full inbox drops it.
    pub fn post(&self, event: E) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(capacity = ?self.tx.capacity(), "Event inbox full, event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event loop gone, event dropped");
                false
            }
        }
    }

    /// Queue an event, waiting for room. Returns false once the loop is gone.
    ///
    /// Only for producer threads that own no bus callback, like the stdin reader.
    pub fn send_blocking(&self, event: E) -> bool {
        self.tx.send_blocking(event).is_ok()
    }
}

/// Bounded inbox processed on the thread that calls `run`
pub struct RunLoop<E> {
    // Kept so the loop never ends for lack of producers
    tx: Sender<E>,
    rx: Receiver<E>,
}

impl<E> RunLoop<E> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub fn sender(&self) -> LoopSender<E> {
        LoopSender {
            tx: self.tx.clone(),
        }
    }

    /// Process events one at a time until `handle` breaks.
    pub fn run(&self, mut handle: impl FnMut(E) -> ControlFlow<()>) {
        while let Ok(event) = self.rx.recv_blocking() {
            if handle(event).is_break() {
                debug!("Run loop stopped");
                return;
            }
        }
    }

    /// Process whatever is already queued and return how many events ran.
    pub fn run_pending(&self, mut handle: impl FnMut(E)) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            handle(event);
            handled += 1;
        }
        handled
    }
}

/// Typed handler for one channel: decode the payload, then act on the state
pub type ChannelHandler<S> = fn(&mut S, Option<&str>);

/// Channel name → handler registration table
pub struct HandlerTable<S> {
    handlers: BTreeMap<&'static str, ChannelHandler<S>>,
}

impl<S> Default for HandlerTable<S> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }
}

impl<S> HandlerTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `channel`, replacing any earlier one
    pub fn on(mut self, channel: &'static str, handler: ChannelHandler<S>) -> Self {
        self.handlers.insert(channel, handler);
        self
    }

    pub fn channels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    /// Subscribe every registered channel, forwarding deliveries into `sender`
    pub fn subscribe_all<E>(&self, bus: &dyn NotificationBus, sender: &LoopSender<E>) -> Result<()>
    where
        E: From<Notification> + Send + 'static,
    {
        for channel in self.channels() {
            let sender = sender.clone();
            let forward: NotificationHandler = Arc::new(move |notification: Notification| {
                sender.post(E::from(notification));
            });
            bus.subscribe(channel, forward)?;
        }
        Ok(())
    }

    /// Run the handler registered for the notification's channel.
    ///
    /// Returns false (and logs) when no handler is registered.
    pub fn dispatch(&self, state: &mut S, notification: &Notification) -> bool {
        match self.handlers.get(notification.name.as_str()) {
            Some(handler) => {
                handler(state, notification.object.as_deref());
                true
            }
            None => {
                warn!(channel = %notification.name, "No handler for channel");
                false
            }
        }
    }
}
