//! Blocking sway/i3 IPC client.
//!
//! Both compositors expose the same protocol on a Unix socket whose path is
//! published in `SWAYSOCK` (sway) or `I3SOCK` (i3).  Every request is one
//! framed message; the reply comes back on the same connection with the same
//! type code.
//!
//! # Waiting for new windows (for beginners)
//!
//! `exec` returns as soon as the program has been started, long before its
//! window exists.  Marking "the focused window" right away would mark the
//! wrong one.  So before running the command, [`SwayClient::make_window`]
//! opens a second connection and subscribes to `window` events; after `exec`
//! it blocks on that connection until a `new` event arrives, then marks the
//! container id carried by the event.  The wait is bounded by
//! [`SwayConfig::window_timeout`].

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rezide_core::protocol::{
    decode_header, encode_message, parse_reply, Command, CommandOutcome, Dimension, EventType,
    Frame, MessageType, Rect, SubscribeReply, TreeNode, WindowEvent, WorkspaceInfo, HEADER_SIZE,
};
use rezide_core::Orientation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::spawn_layout::{WindowManagerError, WindowManagerPort};

/// How long `make_window` waits for the new window by default.
pub const DEFAULT_WINDOW_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Prefix of the marks given to split containers.
pub const SECTION_MARK_PREFIX: &str = "rezide-section-";

/// Connection settings for [`SwayClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwayConfig {
    pub socket_path: PathBuf,
    /// Upper bound on the wait for a window after `exec`.
    pub window_timeout: Duration,
}

impl SwayConfig {
    /// Uses `explicit` if given, else `SWAYSOCK`, else `I3SOCK`.
    ///
    /// # Errors
    ///
    /// Returns [`WindowManagerError::NoSocket`] if none is set.
    pub fn resolve(explicit: Option<PathBuf>, window_timeout: Duration) -> Result<Self, WindowManagerError> {
        let socket_path = explicit
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| non_empty_env("SWAYSOCK"))
            .or_else(|| non_empty_env("I3SOCK"))
            .ok_or(WindowManagerError::NoSocket)?;
        Ok(Self {
            socket_path,
            window_timeout,
        })
    }
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// One window on the focused workspace, as reported by [`SwayClient::workspace_windows`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub id: i64,
    pub name: Option<String>,
    pub marks: Vec<String>,
    pub rect: Rect,
    /// Width in percent of the workspace.
    pub width_percent: u32,
    /// Height in percent of the workspace.
    pub height_percent: u32,
}

// ── Connection ────────────────────────────────────────────────────────────────

/// One socket connection speaking the framed protocol.
struct IpcConnection {
    stream: UnixStream,
}

impl IpcConnection {
    fn connect(path: &Path) -> Result<Self, WindowManagerError> {
        let stream = UnixStream::connect(path).map_err(|source| WindowManagerError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { stream })
    }

    fn send(&mut self, msg_type: MessageType, payload: &[u8]) -> Result<(), WindowManagerError> {
        let bytes = encode_message(msg_type, payload)?;
        self.stream.write_all(&bytes)?;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, WindowManagerError> {
        let mut header = [0u8; HEADER_SIZE];
        self.stream.read_exact(&mut header)?;
        let header = decode_header(&header)?;
        let mut payload = vec![0u8; header.payload_len];
        self.stream.read_exact(&mut payload)?;
        Ok(Frame {
            message_type: header.message_type,
            payload,
        })
    }

    /// Sends a request and decodes its reply, skipping any events in between.
    fn request<T: DeserializeOwned>(
        &mut self,
        msg_type: MessageType,
        payload: &[u8],
    ) -> Result<T, WindowManagerError> {
        debug!("ipc request {msg_type:?} ({} bytes)", payload.len());
        self.send(msg_type, payload)?;
        loop {
            let frame = self.read_frame()?;
            if frame.is_event() {
                continue;
            }
            if frame.message_type != msg_type as u32 {
                return Err(WindowManagerError::UnexpectedReply {
                    expected: msg_type as u32,
                    got: frame.message_type,
                });
            }
            return Ok(parse_reply(&frame.payload)?);
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// A [`WindowManagerPort`] backed by a live sway or i3 instance.
pub struct SwayClient {
    config: SwayConfig,
    commands: IpcConnection,
}

impl SwayClient {
    /// Opens the command connection.
    ///
    /// # Errors
    ///
    /// Returns [`WindowManagerError::Connect`] if the socket cannot be reached.
    pub fn connect(config: SwayConfig) -> Result<Self, WindowManagerError> {
        let commands = IpcConnection::connect(&config.socket_path)?;
        info!("connected to {}", config.socket_path.display());
        Ok(Self { config, commands })
    }

    /// Runs one command and fails unless the window manager reports success.
    fn run(&mut self, command: &Command<'_>) -> Result<(), WindowManagerError> {
        let text = command.to_string();
        debug!("run: {text}");
        let outcomes: Vec<CommandOutcome> =
            self.commands.request(MessageType::RunCommand, text.as_bytes())?;
        match outcomes.into_iter().find(|o| !o.success) {
            Some(failed) => Err(WindowManagerError::CommandFailed {
                command: text,
                reason: failed
                    .error
                    .unwrap_or_else(|| "no reason given".to_string()),
            }),
            None => Ok(()),
        }
    }

    fn tree(&mut self) -> Result<TreeNode, WindowManagerError> {
        self.commands.request(MessageType::GetTree, b"")
    }

    fn focused_workspace(&mut self) -> Result<TreeNode, WindowManagerError> {
        let workspaces: Vec<WorkspaceInfo> = self.commands.request(MessageType::GetWorkspaces, b"")?;
        let name = workspaces
            .into_iter()
            .find(|ws| ws.focused)
            .map(|ws| ws.name)
            .ok_or(WindowManagerError::NoFocusedWorkspace)?;
        let tree = self.tree()?;
        let workspace = tree.find_workspace(&name).cloned();
        workspace.ok_or(WindowManagerError::NoFocusedWorkspace)
    }

    /// Returns the id of the one container carrying `mark`.
    fn marked(&mut self, mark: &str) -> Result<i64, WindowManagerError> {
        let tree = self.tree()?;
        let found = tree.find_marked(mark);
        match found.as_slice() {
            [] => Err(WindowManagerError::MarkNotFound(mark.to_string())),
            [node] => Ok(node.id),
            many => Err(WindowManagerError::AmbiguousMark {
                mark: mark.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Lists the windows of the focused workspace with their marks and sizes.
    ///
    /// # Errors
    ///
    /// Returns [`WindowManagerError`] if the window manager cannot be queried.
    pub fn workspace_windows(&mut self) -> Result<Vec<WindowSummary>, WindowManagerError> {
        let workspace = self.focused_workspace()?;
        let area = workspace.rect;
        let windows = workspace
            .leaves()
            .into_iter()
            .map(|node| WindowSummary {
                id: node.id,
                name: node.name.clone(),
                marks: node.marks.clone(),
                rect: node.rect,
                width_percent: percent_of(node.rect.width, area.width),
                height_percent: percent_of(node.rect.height, area.height),
            })
            .collect();
        Ok(windows)
    }

    /// Subscribes a fresh connection to window events.
    fn subscribe_to_windows(&self) -> Result<IpcConnection, WindowManagerError> {
        let mut events = IpcConnection::connect(&self.config.socket_path)?;
        let payload = serde_json::to_vec(&[EventType::Window.subscription_name()])
            .map_err(|e| WindowManagerError::Other(e.to_string()))?;
        let reply: SubscribeReply = events.request(MessageType::Subscribe, &payload)?;
        if !reply.success {
            return Err(WindowManagerError::CommandFailed {
                command: "subscribe window".to_string(),
                reason: "subscription refused".to_string(),
            });
        }
        Ok(events)
    }

    fn resize(&mut self, mark: &str, dimension: Dimension, percent: u8) -> Result<(), WindowManagerError> {
        let con_id = self.marked(mark)?;
        self.run(&Command::ResizeSet {
            con_id,
            dimension,
            percent,
        })
    }
}

/// Blocks until a `new` window event arrives on `events` or `timeout` passes.
fn wait_for_new_window(
    events: &mut IpcConnection,
    timeout: Duration,
    command: &str,
) -> Result<i64, WindowManagerError> {
    let deadline = Instant::now() + timeout;
    let timed_out = || WindowManagerError::Timeout {
        command: command.to_string(),
        waited: timeout,
    };

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timed_out());
        }
        events.stream.set_read_timeout(Some(remaining))?;

        let frame = match events.read_frame() {
            Ok(frame) => frame,
            Err(WindowManagerError::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                return Err(timed_out());
            }
            Err(e) => return Err(e),
        };

        if frame.message_type != EventType::Window as u32 {
            continue;
        }
        let event: WindowEvent = parse_reply(&frame.payload)?;
        debug!("window event: {} (con {})", event.change, event.container.id);
        if event.change == "new" {
            return Ok(event.container.id);
        }
    }
}

fn percent_of(part: i32, whole: i32) -> u32 {
    if whole <= 0 || part <= 0 {
        return 0;
    }
    ((i64::from(part) * 100 + i64::from(whole) / 2) / i64::from(whole)) as u32
}

impl WindowManagerPort for SwayClient {
    fn count_workspace_windows(&mut self) -> Result<usize, WindowManagerError> {
        let count = self.focused_workspace()?.leaves().len();
        debug!("focused workspace holds {count} windows");
        Ok(count)
    }

    fn make_window(&mut self, mark: &str, command: &str) -> Result<(), WindowManagerError> {
        let mut events = self.subscribe_to_windows()?;
        self.run(&Command::Exec(command))?;
        let con_id = wait_for_new_window(&mut events, self.config.window_timeout, command)?;
        self.run(&Command::Mark { con_id, mark })
    }

    fn focus(&mut self, mark: &str) -> Result<(), WindowManagerError> {
        let con_id = self.marked(mark)?;
        self.run(&Command::Focus { con_id })
    }

    fn split_and_mark_parent(&mut self, orientation: Orientation) -> Result<(), WindowManagerError> {
        let focused = self
            .tree()?
            .find_focused()
            .map(|node| node.id)
            .ok_or(WindowManagerError::NoFocusedWindow)?;
        let section_mark = format!("{SECTION_MARK_PREFIX}{}", Uuid::new_v4());

        self.run(&Command::Split(orientation))?;
        self.run(&Command::FocusParent)?;
        self.run(&Command::MarkFocused(&section_mark))?;
        self.run(&Command::Focus { con_id: focused })
    }

    fn resize_width(&mut self, mark: &str, percent: u8) -> Result<(), WindowManagerError> {
        self.resize(mark, Dimension::Width, percent)
    }

    fn resize_height(&mut self, mark: &str, percent: u8) -> Result<(), WindowManagerError> {
        self.resize(mark, Dimension::Height, percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_rounds_to_nearest() {
        assert_eq!(percent_of(960, 1920), 50);
        assert_eq!(percent_of(640, 1920), 33);
        assert_eq!(percent_of(1280, 1920), 67);
    }

    #[test]
    fn test_percent_of_degenerate_area_is_zero() {
        assert_eq!(percent_of(100, 0), 0);
        assert_eq!(percent_of(-5, 100), 0);
    }

    #[test]
    fn test_sway_config_prefers_explicit_socket() {
        let config =
            SwayConfig::resolve(Some(PathBuf::from("/run/sway.sock")), DEFAULT_WINDOW_TIMEOUT)
                .unwrap();

        assert_eq!(config.socket_path, PathBuf::from("/run/sway.sock"));
        assert_eq!(config.window_timeout, Duration::from_secs(10));
    }
}
