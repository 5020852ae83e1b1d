//! Window-manager adapters implementing
//! [`crate::application::spawn_layout::WindowManagerPort`].
//!
//! - **`sway`** – Blocking client for the sway/i3 IPC socket.
//! - **`recording`** – Applies nothing; records every call in order.

pub mod recording;
pub mod sway;
