//! External command handling via stdin.
//!
//! Drives the headless menu provider for testing and automation, standing in
//! for the file manager's right-click.
//!
//! # Protocol
//!
//! Commands are sent as JSON objects, one per line (JSONL format):
//!
//! ```json
//! {"type": "show"}
//! {"type": "click", "id": 0, "target": "/Users/me/Projects"}
//! {"type": "refresh"}
//! {"type": "quit"}
//! ```
//!
//! End of input acts as `quit`, so a piped batch runs and exits.
//!
//! # Example Usage
//!
//! ```bash
//! # Run the first script against a folder
//! echo '{"type": "click", "id": 0, "target": "/tmp"}' | findermenu menu
//!
//! # `show` prints whatever has arrived so far; give the daemon a moment to answer
//! (echo '{"type": "refresh"}'; sleep 1; echo '{"type": "show"}') | findermenu menu
//! ```

use std::io::BufRead;
use std::thread::JoinHandle;

use crate::logging;
use crate::protocol::{log_preview, ItemId};
use crate::run_loop::LoopSender;

/// External commands that can be sent to the menu process via stdin
///
/// Commands support an optional `requestId` field for correlation.
/// When present, the request_id is logged with all related operations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExternalCommand {
    /// Print the menu a folder-background right-click would show
    Show {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Select a menu item by tag
    /// target: clicked folder; omitted to simulate a missing target
    Click {
        id: ItemId,
        #[serde(default)]
        target: Option<String>,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Ask the daemon for a fresh snapshot
    Refresh {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Stop the menu process
    Quit,
}

/// Parse one JSONL line. Blank or malformed lines yield `None`.
pub fn parse_command(line: &str) -> Option<ExternalCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<ExternalCommand>(line) {
        Ok(cmd) => {
            logging::log("STDIN", &format!("Parsed command: {:?}", cmd));
            Some(cmd)
        }
        Err(e) => {
            let (preview, _) = log_preview(line);
            logging::log(
                "STDIN",
                &format!("Failed to parse command '{}': {}", preview, e),
            );
            None
        }
    }
}

/// Start a thread that reads JSONL commands from `reader` into the run loop.
///
/// End of input (or a read error) posts `Quit`. The thread exits then, or as
/// soon as the run loop is gone.
pub fn spawn_command_reader<R, E>(reader: R, sender: LoopSender<E>) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
    E: From<ExternalCommand> + Send + 'static,
{
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            logging::log("STDIN", "External command listener started");
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        let Some(cmd) = parse_command(&line) else {
                            continue;
                        };
                        // Blocking send: commands are never dropped for a busy loop
                        if !sender.send_blocking(E::from(cmd)) {
                            logging::log("STDIN", "Command channel closed, exiting");
                            return;
                        }
                    }
                    Err(e) => {
                        logging::log("STDIN", &format!("Error reading stdin: {}", e));
                        break;
                    }
                }
            }
            logging::log("STDIN", "End of input, requesting quit");
            sender.send_blocking(E::from(ExternalCommand::Quit));
            logging::log("STDIN", "External command listener exiting");
        })
}

/// Listen on the process's stdin
pub fn start_stdin_listener<E>(sender: LoopSender<E>) -> std::io::Result<JoinHandle<()>>
where
    E: From<ExternalCommand> + Send + 'static,
{
    spawn_command_reader(std::io::BufReader::new(std::io::stdin()), sender)
}

// ============================================================================
// Tests
// ============================================================================
