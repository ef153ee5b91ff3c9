//! In-process notification bus

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::{Notification, NotificationBus, NotificationHandler};
use crate::error::Result;

/// Bus whose subscribers all live in the current process.
///
/// Handlers run synchronously on the publisher's thread.
#[derive(Default)]
pub struct LocalBus {
    handlers: RwLock<HashMap<String, Vec<NotificationHandler>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers registered for `channel`
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.handlers.read().get(channel).map_or(0, Vec::len)
    }
}

impl NotificationBus for LocalBus {
    fn publish(&self, channel: &str, payload: Option<&str>) -> usize {
        // Snapshot the handlers so a handler may publish or subscribe itself
        let handlers = self.handlers.read().get(channel).cloned().unwrap_or_default();
        if handlers.is_empty() {
            debug!(channel, "No subscribers, notification dropped");
            return 0;
        }

        for handler in &handlers {
            handler(Notification::new(channel, payload));
        }
        handlers.len()
    }

    fn subscribe(&self, channel: &str, handler: NotificationHandler) -> Result<()> {
        self.handlers
            .write()
            .entry(channel.to_string())
            .or_default()
            .push(handler);
        debug!(channel, "Subscribed");
        Ok(())
    }
}
