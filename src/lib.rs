//! findermenu - run user scripts from a folder's right-click menu
//!
//! Two processes cooperate over a per-user notification bus: a daemon that
//! owns the script registry and launches scripts, and a menu provider that
//! renders the menu and reports clicks. They share no memory; every exchange
//! is one of three broadcast notifications (see `protocol`).

pub mod bus;
pub mod config;
pub mod daemon;
pub mod error;
pub mod executor;
pub mod logging;
pub mod menu_provider;
pub mod protocol;
pub mod run_loop;
pub mod scripts;
pub mod stdin_commands;
