//! Background daemon: owns the script registry and answers the menu provider

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::bus::{Notification, NotificationBus};
use crate::error::{ReportExt, Result};
use crate::executor::ScriptRunner;
use crate::protocol::{
    decode_click, encode_menu_items, ClickEvent, MENU_ITEM_CLICKED_NOTIF,
    MENU_ITEM_INFO_NOTIF, MENU_ITEM_INFO_REQUEST_NOTIF,
};
use crate::run_loop::{HandlerTable, LoopSender, RunLoop};
use crate::scripts::ScriptRegistry;

/// Daemon state.
///
/// The registry is built before construction and never changes afterward:
/// scripts added or removed later stay invisible until the next run.
pub struct ServiceDaemon {
    registry: ScriptRegistry,
    runner: ScriptRunner,
    bus: Arc<dyn NotificationBus>,
}

impl ServiceDaemon {
    pub fn new(registry: ScriptRegistry, runner: ScriptRunner, bus: Arc<dyn NotificationBus>) -> Self {
        Self {
            registry,
            runner,
            bus,
        }
    }

    /// Channels the daemon listens on
    pub fn handlers() -> HandlerTable<Self> {
        HandlerTable::new()
            .on(MENU_ITEM_INFO_REQUEST_NOTIF, Self::on_menu_request)
            .on(MENU_ITEM_CLICKED_NOTIF, Self::on_item_clicked)
    }

    /// Subscribe to both request channels, then announce the snapshot once.
    ///
    /// The announcement covers a provider that started first and already
    /// asked.
    pub fn start(&self, sender: &LoopSender<Notification>) -> Result<()> {
        Self::handlers().subscribe_all(self.bus.as_ref(), sender)?;
        info!(
            event_type = "daemon_lifecycle",
            scripts = self.registry.len(),
            "Daemon started"
        );
        self.publish_snapshot();
        Ok(())
    }

    /// Broadcast the current registry as a menu snapshot.
    ///
    /// Returns how many subscribers received it.
    pub fn publish_snapshot(&self) -> usize {
        let Some(payload) = encode_menu_items(&self.registry.menu_items()).report() else {
            return 0;
        };
        let delivered = self.bus.publish(MENU_ITEM_INFO_NOTIF, Some(&payload));
        debug!(items = self.registry.len(), delivered, "Published menu snapshot");
        delivered
    }

    fn on_menu_request(&mut self, _payload: Option<&str>) {
        debug!("Menu requested");
        self.publish_snapshot();
    }

    fn on_item_clicked(&mut self, payload: Option<&str>) {
        if let Some(click) = decode_click(payload).report() {
            self.dispatch_click(&click);
        }
    }

    /// Run the script a click refers to.
    ///
    /// Unknown ids are logged and ignored. Returns the child pid when a
    /// script was launched.
    #[instrument(skip_all, fields(id = click.id))]
    pub fn dispatch_click(&self, click: &ClickEvent) -> Option<u32> {
        let Some(script) = self.registry.get(click.id) else {
            warn!(
                id = click.id,
                scripts = self.registry.len(),
                "Click for unknown script id, ignoring"
            );
            return None;
        };
        self.runner.run(script, Path::new(&click.target))
    }

    /// Serve bus events on the calling thread forever.
    pub fn run(mut self, run_loop: &RunLoop<Notification>) {
        let handlers = Self::handlers();
        run_loop.run(|notification| {
            handlers.dispatch(&mut self, &notification);
            ControlFlow::Continue(())
        });
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
