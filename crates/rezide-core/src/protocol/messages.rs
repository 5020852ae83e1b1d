//! sway/i3 IPC message types, reply payloads, and window-manager commands.
//!
//! Requests carry a [`MessageType`]; unsolicited events carry an
//! [`EventType`] whose high bit is set.  Reply payloads are JSON and decode
//! into the structs below.  Only the fields rezide reads are modelled; unknown
//! fields are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::node::Orientation;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Magic string that starts every frame.
pub const MAGIC: &[u8; 6] = b"i3-ipc";

/// Size of the frame header: magic (6) + payload length (4) + type (4).
pub const HEADER_SIZE: usize = 14;

/// Bit set in the type field of every event frame.
pub const EVENT_MASK: u32 = 0x8000_0000;

// ── Message type codes ────────────────────────────────────────────────────────

/// Request (and matching reply) type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    RunCommand = 0,
    GetWorkspaces = 1,
    Subscribe = 2,
    GetOutputs = 3,
    GetTree = 4,
    GetMarks = 5,
    GetBarConfig = 6,
    GetVersion = 7,
}

impl TryFrom<u32> for MessageType {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, ()> {
        match value {
            0 => Ok(MessageType::RunCommand),
            1 => Ok(MessageType::GetWorkspaces),
            2 => Ok(MessageType::Subscribe),
            3 => Ok(MessageType::GetOutputs),
            4 => Ok(MessageType::GetTree),
            5 => Ok(MessageType::GetMarks),
            6 => Ok(MessageType::GetBarConfig),
            7 => Ok(MessageType::GetVersion),
            _ => Err(()),
        }
    }
}

/// Event type codes, as they appear on the wire (high bit set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventType {
    Workspace = EVENT_MASK,
    Output = EVENT_MASK | 1,
    Mode = EVENT_MASK | 2,
    Window = EVENT_MASK | 3,
    BarConfigUpdate = EVENT_MASK | 4,
    Binding = EVENT_MASK | 5,
    Shutdown = EVENT_MASK | 6,
    Tick = EVENT_MASK | 7,
}

impl EventType {
    /// Name used when subscribing to this event.
    pub fn subscription_name(&self) -> &'static str {
        match self {
            EventType::Workspace => "workspace",
            EventType::Output => "output",
            EventType::Mode => "mode",
            EventType::Window => "window",
            EventType::BarConfigUpdate => "barconfig_update",
            EventType::Binding => "binding",
            EventType::Shutdown => "shutdown",
            EventType::Tick => "tick",
        }
    }
}

impl TryFrom<u32> for EventType {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, ()> {
        if value & EVENT_MASK == 0 {
            return Err(());
        }
        match value & !EVENT_MASK {
            0 => Ok(EventType::Workspace),
            1 => Ok(EventType::Output),
            2 => Ok(EventType::Mode),
            3 => Ok(EventType::Window),
            4 => Ok(EventType::BarConfigUpdate),
            5 => Ok(EventType::Binding),
            6 => Ok(EventType::Shutdown),
            7 => Ok(EventType::Tick),
            _ => Err(()),
        }
    }
}

// ── Reply payloads ────────────────────────────────────────────────────────────

/// Result of one command in a `RUN_COMMAND` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply to a `SUBSCRIBE` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeReply {
    pub success: bool,
}

/// One entry of a `GET_WORKSPACES` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    /// Workspace number, or -1 for named workspaces.
    pub num: i32,
    pub name: String,
    pub focused: bool,
    #[serde(default)]
    pub visible: bool,
}

/// Pixel rectangle of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Kind of a node in the `GET_TREE` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Output,
    Workspace,
    Con,
    FloatingCon,
    Dockarea,
    #[serde(other)]
    Other,
}

/// A container in the window manager's layout tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub marks: Vec<String>,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub floating_nodes: Vec<TreeNode>,
}

impl TreeNode {
    /// Iterates over the tiling and floating children of this node.
    fn children(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }

    /// Returns every node below this one, depth-first.
    pub fn descendants(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&TreeNode> = self.children().collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mark = stack.len();
            stack.extend(node.children());
            stack[mark..].reverse();
        }
        out
    }

    /// Returns the focused node in this subtree, if any.
    pub fn find_focused(&self) -> Option<&TreeNode> {
        if self.focused {
            return Some(self);
        }
        self.descendants().into_iter().find(|node| node.focused)
    }

    /// Returns every node in this subtree carrying exactly `mark`.
    pub fn find_marked(&self, mark: &str) -> Vec<&TreeNode> {
        std::iter::once(self)
            .chain(self.descendants())
            .filter(|node| node.marks.iter().any(|m| m == mark))
            .collect()
    }

    /// Returns the workspace node called `name`.
    pub fn find_workspace(&self, name: &str) -> Option<&TreeNode> {
        self.descendants().into_iter().find(|node| {
            node.node_type == NodeType::Workspace && node.name.as_deref() == Some(name)
        })
    }

    /// Returns the windows of this subtree: containers without children.
    pub fn leaves(&self) -> Vec<&TreeNode> {
        self.descendants()
            .into_iter()
            .filter(|node| {
                matches!(node.node_type, NodeType::Con | NodeType::FloatingCon)
                    && node.nodes.is_empty()
                    && node.floating_nodes.is_empty()
            })
            .collect()
    }
}

/// Payload of a `window` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowEvent {
    /// What happened: `"new"`, `"focus"`, `"close"`, `"mark"`, ...
    pub change: String,
    pub container: TreeNode,
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Which side a resize command sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
}

/// A window-manager command sent with [`MessageType::RunCommand`].
///
/// `Display` renders the command text, including criteria and quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Run a shell command; its window opens where focus is.
    Exec(&'a str),
    /// Add `mark` to the container `con_id`, keeping its other marks.
    Mark { con_id: i64, mark: &'a str },
    /// Add `mark` to the focused container.
    MarkFocused(&'a str),
    /// Focus the container `con_id`.
    Focus { con_id: i64 },
    /// Move focus to the parent of the focused container.
    FocusParent,
    /// Split the focused container.
    Split(Orientation),
    /// Set the width or height of `con_id` in percent of its parent.
    ResizeSet {
        con_id: i64,
        dimension: Dimension,
        percent: u8,
    },
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Exec(cmd) => write!(f, "exec {}", quote(cmd)),
            Command::Mark { con_id, mark } => {
                write!(f, "[con_id={con_id}] mark --add {}", quote(mark))
            }
            Command::MarkFocused(mark) => write!(f, "mark --add {}", quote(mark)),
            Command::Focus { con_id } => write!(f, "[con_id={con_id}] focus"),
            Command::FocusParent => f.write_str("focus parent"),
            Command::Split(orientation) => write!(f, "split {orientation}"),
            Command::ResizeSet {
                con_id,
                dimension,
                percent,
            } => {
                let side = match dimension {
                    Dimension::Width => "width",
                    Dimension::Height => "height",
                };
                write!(f, "[con_id={con_id}] resize set {side} {percent} ppt")
            }
        }
    }
}

/// Wraps `arg` in double quotes, escaping backslashes and quotes.
fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
