//! Cross-process notification bus over Unix datagram sockets
//!
//! Layout under the bus directory:
//!
//! ```text
//! <bus_dir>/<channel>/<pid>-<seq>.sock   one socket per live subscription
//! ```
//!
//! Publishing sends one datagram holding a JSON envelope
//! `{"name": ..., "object": ...}` to every socket in the channel directory.
//! Sends are non-blocking, so a subscriber with a full queue misses the
//! message rather than stalling the publisher.

use std::fs::{self, DirBuilder};
use std::io::ErrorKind;
use std::net::Shutdown;
use std::os::fd::AsRawFd;
use std::os::unix::fs::DirBuilderExt;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{Notification, NotificationBus, NotificationHandler};
use crate::error::{FinderMenuError, Result};
use crate::protocol::log_preview;

/// Largest envelope a subscriber will read in one datagram
pub const MAX_DATAGRAM_BYTES: usize = 64 * 1024;

/// Kernel buffer for each socket: one full datagram plus per-datagram overhead
const SOCKET_BUFFER_BYTES: usize = MAX_DATAGRAM_BYTES * 2;

const SOCKET_EXTENSION: &str = "sock";

/// A bound subscription socket, torn down with the bus
struct Subscription {
    path: PathBuf,
    socket: UnixDatagram,
    closed: Arc<AtomicBool>,
}

/// Per-user bus shared by every process pointing at the same directory
pub struct SocketBus {
    root: PathBuf,
    sender: UnixDatagram,
    next_seq: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SocketBus {
    /// Open (creating if needed) the bus rooted at `root`
    pub fn open(root: &Path) -> Result<Self> {
        create_private_dir(root)?;

        let sender = UnixDatagram::unbound()?;
        sender.set_nonblocking(true)?;
        // Platform defaults can be far below one datagram (2 KiB on macOS)
        if let Err(e) = set_buffer_size(&sender, libc::SO_SNDBUF) {
            warn!(error = %e, "Failed to raise send buffer; large notifications may be dropped");
        }

        info!(bus_dir = %root.display(), "Notification bus opened");
        Ok(Self {
            root: root.to_path_buf(),
            sender,
            next_seq: AtomicU64::new(0),
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    fn channel_dir(&self, channel: &str) -> Result<PathBuf> {
        validate_channel(channel)?;
        Ok(self.root.join(channel))
    }

    /// Send one datagram to one subscriber socket. Returns true if handed over.
    fn deliver(&self, socket_path: &Path, bytes: &[u8]) -> bool {
        match self.sender.send_to(bytes, socket_path) {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                debug!(socket = %socket_path.display(), "Subscriber queue full, notification dropped");
                false
            }
            Err(e) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::NotFound) => {
                // Owner exited without cleaning up
                debug!(socket = %socket_path.display(), "Removing stale subscriber socket");
                let _ = fs::remove_file(socket_path);
                false
            }
            Err(e) if matches!(e.raw_os_error(), Some(libc::EMSGSIZE) | Some(libc::ENOBUFS)) => {
                warn!(
                    socket = %socket_path.display(),
                    bytes = bytes.len(),
                    error = %e,
                    "Payload too large for transport, notification dropped"
                );
                false
            }
            Err(e) => {
                warn!(socket = %socket_path.display(), error = %e, "Failed to deliver notification");
                false
            }
        }
    }
}

impl NotificationBus for SocketBus {
    fn publish(&self, channel: &str, payload: Option<&str>) -> usize {
        let dir = match self.channel_dir(channel) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(channel, error = %e, "Refusing to publish");
                return 0;
            }
        };

        let envelope = Notification::new(channel, payload);
        let bytes = match serde_json::to_vec(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(channel, error = %e, "Failed to serialize notification envelope");
                return 0;
            }
        };
        if bytes.len() > MAX_DATAGRAM_BYTES {
            warn!(
                channel,
                bytes = bytes.len(),
                max = MAX_DATAGRAM_BYTES,
                "Notification too large, dropped"
            );
            return 0;
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(channel, "No subscribers, notification dropped");
                return 0;
            }
            Err(e) => {
                warn!(channel, error = %e, "Failed to list subscribers");
                return 0;
            }
        };

        let delivered = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == SOCKET_EXTENSION))
            .filter(|path| self.deliver(path, &bytes))
            .count();

        debug!(channel, delivered, "Notification published");
        delivered
    }

    fn subscribe(&self, channel: &str, handler: NotificationHandler) -> Result<()> {
        let dir = self.channel_dir(channel)?;
        let bus_err = |source: std::io::Error| FinderMenuError::Bus {
            channel: channel.to_string(),
            source,
        };

        create_private_dir(&dir).map_err(bus_err)?;

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!(
            "{}-{}.{}",
            std::process::id(),
            seq,
            SOCKET_EXTENSION
        ));
        // Left behind by an earlier process that had our pid
        if path.exists() {
            let _ = fs::remove_file(&path);
        }

        let socket = UnixDatagram::bind(&path).map_err(bus_err)?;
        if let Err(e) = set_buffer_size(&socket, libc::SO_RCVBUF) {
            warn!(channel, error = %e, "Failed to raise receive buffer; large notifications may be dropped");
        }
        let reader = socket.try_clone().map_err(bus_err)?;
        let closed = Arc::new(AtomicBool::new(false));

        let reader_closed = closed.clone();
        let reader_channel = channel.to_string();
        std::thread::Builder::new()
            .name(format!("bus-{}", channel))
            .spawn(move || read_loop(reader, &reader_channel, handler, &reader_closed))
            .map_err(bus_err)?;

        info!(channel, socket = %path.display(), "Subscribed");
        self.subscriptions.lock().push(Subscription {
            path,
            socket,
            closed,
        });
        Ok(())
    }
}

impl Drop for SocketBus {
    fn drop(&mut self) {
        for subscription in self.subscriptions.lock().drain(..) {
            subscription.closed.store(true, Ordering::Release);
            let _ = subscription.socket.shutdown(Shutdown::Both);
            if let Err(e) = fs::remove_file(&subscription.path) {
                debug!(socket = %subscription.path.display(), error = %e, "Failed to remove socket");
            }
        }
    }
}

fn read_loop(socket: UnixDatagram, channel: &str, handler: NotificationHandler, closed: &AtomicBool) {
    let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
    loop {
        let len = match socket.recv(&mut buf) {
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                if !closed.load(Ordering::Acquire) {
                    warn!(channel, error = %e, "Subscription socket failed");
                }
                break;
            }
        };
        if closed.load(Ordering::Acquire) {
            break;
        }

        let notification = match serde_json::from_slice::<Notification>(&buf[..len]) {
            Ok(notification) => notification,
            Err(e) => {
                let raw = String::from_utf8_lossy(&buf[..len]);
                let (preview, raw_len) = log_preview(&raw);
                warn!(channel, error = %e, raw_preview = %preview, raw_len, "Malformed notification envelope");
                continue;
            }
        };

        if notification.name != channel {
            warn!(channel, name = %notification.name, "Notification arrived on the wrong channel");
            continue;
        }

        handler(notification);
    }
    debug!(channel, "Subscription reader exiting");
}

/// Channel names become directory names
fn validate_channel(channel: &str) -> Result<()> {
    let valid = !channel.is_empty()
        && !channel.starts_with('.')
        && !channel.contains(['/', '\0']);
    if valid {
        Ok(())
    } else {
        Err(FinderMenuError::Bus {
            channel: channel.to_string(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "invalid channel name"),
        })
    }
}

fn set_buffer_size(socket: &UnixDatagram, option: libc::c_int) -> std::io::Result<()> {
    let size = SOCKET_BUFFER_BYTES as libc::c_int;
    // SAFETY: the fd is owned by `socket` for the whole call and the option
    // value is a c_int whose exact length is passed alongside it.
    let rc = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            option,
            &size as *const libc::c_int as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

fn create_private_dir(path: &Path) -> std::io::Result<()> {
    DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    fn forwarding_handler() -> (NotificationHandler, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let handler: NotificationHandler = Arc::new(move |n: Notification| {
            let _ = tx.lock().send(n);
        });
        (handler, rx)
    }

    fn socket_files(dir: &Path) -> Vec<PathBuf> {
        match fs::read_dir(dir) {
            Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_publish_without_subscribers_returns_zero() {
        let temp_dir = TempDir::new().unwrap();
        let bus = SocketBus::open(temp_dir.path()).unwrap();
        assert_eq!(bus.publish("menuItemInfoNotif", Some("[]")), 0);
    }

    #[test]
    fn test_notification_crosses_bus_instances() {
        let temp_dir = TempDir::new().unwrap();
        let daemon_side = SocketBus::open(temp_dir.path()).unwrap();
        let provider_side = SocketBus::open(temp_dir.path()).unwrap();

        let (handler, rx) = forwarding_handler();
        provider_side.subscribe("menuItemInfoNotif", handler).unwrap();

        let payload = r#"[{"id":0,"title":"Zip"}]"#;
        assert_eq!(daemon_side.publish("menuItemInfoNotif", Some(payload)), 1);

        let received = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(received, Notification::new("menuItemInfoNotif", Some(payload)));
    }

    #[test]
    fn test_signal_without_object_survives_transport() {
        let temp_dir = TempDir::new().unwrap();
        let bus = SocketBus::open(temp_dir.path()).unwrap();
        let (handler, rx) = forwarding_handler();
        bus.subscribe("menuItemInfoRequestNotif", handler).unwrap();

        assert_eq!(bus.publish("menuItemInfoRequestNotif", None), 1);
        assert_eq!(rx.recv_timeout(WAIT).unwrap().object, None);
    }

    #[test]
    fn test_every_subscriber_gets_a_copy() {
        let temp_dir = TempDir::new().unwrap();
        let bus = SocketBus::open(temp_dir.path()).unwrap();
        let (first, first_rx) = forwarding_handler();
        let (second, second_rx) = forwarding_handler();
        bus.subscribe("menuItemClickedNotif", first).unwrap();
        bus.subscribe("menuItemClickedNotif", second).unwrap();

        assert_eq!(bus.publish("menuItemClickedNotif", Some("{}")), 2);
        assert!(first_rx.recv_timeout(WAIT).is_ok());
        assert!(second_rx.recv_timeout(WAIT).is_ok());
    }

    #[test]
    fn test_stale_socket_is_removed_on_publish() {
        let temp_dir = TempDir::new().unwrap();
        let bus = SocketBus::open(temp_dir.path()).unwrap();
        let channel_dir = temp_dir.path().join("menuItemInfoNotif");
        fs::create_dir_all(&channel_dir).unwrap();

        let stale = channel_dir.join("999999-0.sock");
        drop(UnixDatagram::bind(&stale).unwrap());
        assert!(stale.exists());

        assert_eq!(bus.publish("menuItemInfoNotif", Some("[]")), 0);
        assert!(!stale.exists());
    }

    #[test]
    fn test_envelope_for_other_channel_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let bus = SocketBus::open(temp_dir.path()).unwrap();
        let (handler, rx) = forwarding_handler();
        bus.subscribe("menuItemClickedNotif", handler).unwrap();

        let socket_path = socket_files(&temp_dir.path().join("menuItemClickedNotif"))
            .pop()
            .unwrap();
        let raw = UnixDatagram::unbound().unwrap();
        raw.send_to(br#"{"name":"menuItemInfoNotif","object":"[]"}"#, &socket_path)
            .unwrap();
        raw.send_to(b"garbage", &socket_path).unwrap();
        raw.send_to(br#"{"name":"menuItemClickedNotif","object":"ok"}"#, &socket_path)
            .unwrap();

        // Only the well-formed, correctly named envelope comes through
        let received = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(received.object.as_deref(), Some("ok"));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_drop_removes_subscription_sockets() {
        let temp_dir = TempDir::new().unwrap();
        let channel_dir = temp_dir.path().join("menuItemInfoNotif");
        {
            let bus = SocketBus::open(temp_dir.path()).unwrap();
            let (handler, _rx) = forwarding_handler();
            bus.subscribe("menuItemInfoNotif", handler).unwrap();
            assert_eq!(socket_files(&channel_dir).len(), 1);
        }
        assert!(socket_files(&channel_dir).is_empty());
    }

    fn buffer_size(socket: &UnixDatagram, option: libc::c_int) -> usize {
        let mut size: libc::c_int = 0;
        let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
        let rc = unsafe {
            libc::getsockopt(
                socket.as_raw_fd(),
                libc::SOL_SOCKET,
                option,
                &mut size as *mut libc::c_int as *mut libc::c_void,
                &mut len,
            )
        };
        assert_eq!(rc, 0);
        size as usize
    }

    #[test]
    fn test_socket_buffers_hold_a_full_datagram() {
        let temp_dir = TempDir::new().unwrap();
        let bus = SocketBus::open(temp_dir.path()).unwrap();
        let (handler, _rx) = forwarding_handler();
        bus.subscribe("menuItemInfoNotif", handler).unwrap();

        assert!(buffer_size(&bus.sender, libc::SO_SNDBUF) >= MAX_DATAGRAM_BYTES);
        let subscriptions = bus.subscriptions.lock();
        assert!(buffer_size(&subscriptions[0].socket, libc::SO_RCVBUF) >= MAX_DATAGRAM_BYTES);
    }

    #[test]
    fn test_large_snapshot_crosses_bus() {
        let temp_dir = TempDir::new().unwrap();
        let daemon_side = SocketBus::open(temp_dir.path()).unwrap();
        let provider_side = SocketBus::open(temp_dir.path()).unwrap();
        let (handler, rx) = forwarding_handler();
        provider_side.subscribe("menuItemInfoNotif", handler).unwrap();

        // Well past the 2 KiB platform default, escaped once more in the envelope
        let items: Vec<String> = (0..200)
            .map(|id| format!(r#"{{"id":{},"title":"Script number {}"}}"#, id, id))
            .collect();
        let payload = format!("[{}]", items.join(","));
        assert!(payload.len() > 4096);

        assert_eq!(daemon_side.publish("menuItemInfoNotif", Some(&payload)), 1);
        let received = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(received.object.as_deref(), Some(payload.as_str()));
    }

    #[test]
    fn test_oversized_payload_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let bus = SocketBus::open(temp_dir.path()).unwrap();
        let (handler, _rx) = forwarding_handler();
        bus.subscribe("menuItemInfoNotif", handler).unwrap();

        let huge = "x".repeat(MAX_DATAGRAM_BYTES + 1);
        assert_eq!(bus.publish("menuItemInfoNotif", Some(&huge)), 0);
    }

    #[test]
    fn test_invalid_channel_names_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let bus = SocketBus::open(temp_dir.path()).unwrap();
        let (handler, _rx) = forwarding_handler();

        assert!(bus.subscribe("../escape", handler.clone()).is_err());
        assert!(bus.subscribe("", handler.clone()).is_err());
        assert!(bus.subscribe(".hidden", handler).is_err());
        assert_eq!(bus.publish("a/b", None), 0);
    }

    #[test]
    fn test_bus_directory_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("bus");
        let _bus = SocketBus::open(&root).unwrap();

        let mode = fs::metadata(&root).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
