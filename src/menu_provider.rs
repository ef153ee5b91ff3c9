//! UI-side menu provider
//!
//! Holds the last menu snapshot received from the daemon and turns menu
//! selections into click events. The provider never sees script paths; it only
//! knows ids and titles.
//!
//! States: `Empty` until the first valid snapshot, then `Ready`. A snapshot that
//! fails to decode leaves the current state untouched.

use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bus::{Notification, NotificationBus};
use crate::error::{ReportExt, Result, ResultExt};
use crate::protocol::{
    decode_menu_items, encode_click, ClickEvent, ItemId, MenuItem, MENU_ITEM_CLICKED_NOTIF,
    MENU_ITEM_INFO_NOTIF, MENU_ITEM_INFO_REQUEST_NOTIF,
};
use crate::run_loop::{HandlerTable, LoopSender};
use crate::stdin_commands::ExternalCommand;

/// Where the user right-clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    /// Empty area of a folder window
    ContainerBackground,
    /// One or more selected items
    ItemSelection,
    Sidebar,
    Toolbar,
}

/// One rendered menu entry. `tag` carries the item id back on click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub title: String,
    pub tag: ItemId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub entries: Vec<MenuEntry>,
}

impl Menu {
    /// Build a menu from a snapshot, keeping snapshot order
    pub fn from_items(items: &[MenuItem]) -> Self {
        Self {
            entries: items
                .iter()
                .map(|item| MenuEntry {
                    title: item.title.clone(),
                    tag: item.id,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum MenuState {
    Empty,
    Ready(Menu),
}

/// Everything the menu process's run loop handles
#[derive(Debug)]
pub enum ProviderEvent {
    Notification(Notification),
    Command(ExternalCommand),
}

impl From<Notification> for ProviderEvent {
    fn from(notification: Notification) -> Self {
        ProviderEvent::Notification(notification)
    }
}

impl From<ExternalCommand> for ProviderEvent {
    fn from(cmd: ExternalCommand) -> Self {
        ProviderEvent::Command(cmd)
    }
}

pub struct MenuProvider {
    state: MenuState,
    bus: Arc<dyn NotificationBus>,
}

impl MenuProvider {
    pub fn new(bus: Arc<dyn NotificationBus>) -> Self {
        Self {
            state: MenuState::Empty,
            bus,
        }
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn handlers() -> HandlerTable<Self> {
        HandlerTable::new().on(MENU_ITEM_INFO_NOTIF, Self::on_menu_snapshot)
    }

    /// Subscribe to snapshots, then ask for one.
    pub fn start<E>(&self, sender: &LoopSender<E>) -> Result<()>
    where
        E: From<Notification> + Send + 'static,
    {
        Self::handlers().subscribe_all(self.bus.as_ref(), sender)?;
        info!(event_type = "provider_lifecycle", "Menu provider started");
        self.request_menu();
        Ok(())
    }

    /// Ask the daemon to publish its snapshot. Safe to repeat.
    pub fn request_menu(&self) -> usize {
        let delivered = self.bus.publish(MENU_ITEM_INFO_REQUEST_NOTIF, None);
        if delivered == 0 {
            debug!("Menu request had no listener; waiting for the daemon's announcement");
        }
        delivered
    }

    fn on_menu_snapshot(&mut self, payload: Option<&str>) {
        self.apply_snapshot(payload);
    }

    /// Replace the menu with a decoded snapshot.
    ///
    /// Returns false, keeping the previous menu, when the payload is invalid.
    pub fn apply_snapshot(&mut self, payload: Option<&str>) -> bool {
        let Some(items) = decode_menu_items(payload).report() else {
            return false;
        };
        let menu = Menu::from_items(&items);
        info!(items = menu.len(), "Menu rebuilt");
        self.state = MenuState::Ready(menu);
        true
    }

    /// The menu to show for a right-click, if any.
    ///
    /// Only folder backgrounds get a menu, and only once a snapshot arrived.
    pub fn menu_for(&self, kind: MenuKind) -> Option<&Menu> {
        match (kind, &self.state) {
            (MenuKind::ContainerBackground, MenuState::Ready(menu)) => Some(menu),
            _ => None,
        }
    }

    /// Publish a click on the entry tagged `tag` against `target`.
    ///
    /// Without a target nothing is published. Returns whether a click went out
    /// to at least one subscriber.
    pub fn item_clicked(&self, tag: ItemId, target: Option<&Path>) -> bool {
        let Some(target) = target else {
            warn!(tag, "Failed to obtain targeted folder, click dropped");
            return false;
        };
        let Some(target) = std::path::absolute(target).warn_on_err() else {
            return false;
        };

        let click = ClickEvent::new(tag, target.to_string_lossy());
        let Some(payload) = encode_click(&click).report() else {
            return false;
        };
        let delivered = self.bus.publish(MENU_ITEM_CLICKED_NOTIF, Some(&payload));
        info!(tag, target = %click.target, delivered, "Menu item clicked");
        delivered > 0
    }

    /// Handle one run-loop event. `out` receives `show` responses.
    pub fn handle_event(
        &mut self,
        handlers: &HandlerTable<Self>,
        event: ProviderEvent,
        out: &mut impl Write,
    ) -> ControlFlow<()> {
        match event {
            ProviderEvent::Notification(notification) => {
                handlers.dispatch(self, &notification);
            }
            ProviderEvent::Command(ExternalCommand::Show { request_id }) => {
                debug!(request_id = ?request_id, "Show requested");
                let response = serde_json::json!({
                    "requestId": request_id,
                    "menu": &self.state,
                });
                writeln!(out, "{}", response)
                    .and_then(|_| out.flush())
                    .log_err();
            }
            ProviderEvent::Command(ExternalCommand::Click {
                id,
                target,
                request_id,
            }) => {
                debug!(request_id = ?request_id, id, "Click requested");
                self.item_clicked(id, target.as_deref().map(Path::new));
            }
            ProviderEvent::Command(ExternalCommand::Refresh { request_id }) => {
                debug!(request_id = ?request_id, "Refresh requested");
                self.request_menu();
            }
            ProviderEvent::Command(ExternalCommand::Quit) => {
                info!(event_type = "provider_lifecycle", "Quit requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
#[path = "menu_provider_tests.rs"]
mod tests;
