//! # rezide-core
//!
//! Shared library for rezide containing the layout tree, the validator that
//! turns raw layout definitions into that tree, the spawn scheduler, and the
//! sway/i3 IPC wire codec.
//!
//! It has zero dependencies on OS APIs, sockets, or the file system.
//!
//! # Architecture overview (for beginners)
//!
//! rezide opens a declaratively described set of windows on a tiling window
//! manager.  The window manager only understands three things: "start a
//! program" (the new window takes focus), "focus the window with this mark",
//! and "split whatever is focused".  Turning a nested layout into a sequence of
//! those commands is the whole job of this crate.
//!
//! - **`domain`** – Pure logic.  `definitions` checks the raw named entries
//!   read from a config file and resolves one of them into a [`Node`] tree;
//!   `schedule` linearizes that tree into an ordered list of [`Operation`]s.
//!
//! - **`protocol`** – How bytes travel to the window manager.  Requests and
//!   replies are framed with a 14-byte header (`"i3-ipc"` magic, payload
//!   length, message type) followed by a JSON payload.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `rezide_core::Node` instead of `rezide_core::domain::node::Node`.
pub use domain::definitions::{
    build, layout_names, validate, ErrorClass, LayoutError, LayoutSet, RawValue,
};
pub use domain::node::{leftmost_descendant, Node, Orientation, Section, SectionChild, Window};
pub use domain::schedule::{schedule, Operation};
pub use protocol::codec::{decode_header, decode_message, encode_message, ProtocolError};
pub use protocol::messages::MessageType;
