//! Cross-process protocol between the menu provider and the service daemon
//!
//! Three notification channels carry everything the two processes exchange.
//! Payloads are single JSON values.
//!
//! | channel | direction | payload |
//! |---|---|---|
//! | `menuItemInfoRequestNotif` | provider → daemon | none |
//! | `menuItemInfoNotif` | daemon → provider | `[{"id":0,"title":"..."}]` |
//! | `menuItemClickedNotif` | provider → daemon | `{"id":0,"target":"/abs/path"}` |
//!
//! # Module Structure
//!
//! - `types`: the `MenuItem` and `ClickEvent` wire records
//! - `io`: encode/decode for both payload shapes

mod io;
mod types;

pub use io::*;
pub use types::*;

/// Provider asks the daemon to (re)publish its snapshot. Signal only.
pub const MENU_ITEM_INFO_REQUEST_NOTIF: &str = "menuItemInfoRequestNotif";

/// Daemon publishes its menu snapshot.
pub const MENU_ITEM_INFO_NOTIF: &str = "menuItemInfoNotif";

/// Provider reports a click on a menu item.
pub const MENU_ITEM_CLICKED_NOTIF: &str = "menuItemClickedNotif";
