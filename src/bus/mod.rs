//! Notification bus - broadcast of named notifications between processes
//!
//! A notification is a channel name plus an optional string object. Delivery
//! is best effort and at most once: nothing is queued for absent subscribers,
//! nothing is acknowledged, and publishers are not authenticated.
//!
//! # Module Structure
//!
//! - `local` - in-process bus, same semantics, for tests and single-process use
//! - `socket` - per-user cross-process bus over Unix datagram sockets

mod local;
#[cfg(unix)]
mod socket;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use local::LocalBus;
#[cfg(unix)]
pub use socket::SocketBus;

/// One broadcast message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Channel the notification was posted on
    pub name: String,
    /// Payload, absent for pure signals
    pub object: Option<String>,
}

impl Notification {
    pub fn new(name: impl Into<String>, object: Option<&str>) -> Self {
        Self {
            name: name.into(),
            object: object.map(str::to_string),
        }
    }
}

/// Callback invoked for each notification delivered on a subscribed channel.
///
/// May be called from a bus thread; handlers normally just forward into a
/// `RunLoop` inbox.
pub type NotificationHandler = Arc<dyn Fn(Notification) + Send + Sync>;

/// Named-channel broadcast shared by every process of the same user
pub trait NotificationBus: Send + Sync {
    /// Broadcast `payload` on `channel` to everyone currently subscribed.
    ///
    /// Returns how many subscribers the message was handed to. Zero means it
    /// was dropped. Failures are logged, never returned.
    fn publish(&self, channel: &str, payload: Option<&str>) -> usize;

    /// Start delivering `channel` notifications to `handler`
    fn subscribe(&self, channel: &str, handler: NotificationHandler) -> Result<()>;
}
