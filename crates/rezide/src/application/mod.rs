//! Application layer use cases.
//!
//! - **`spawn_layout`** – Validates a layout set, resolves one layout, and
//!   drives the scheduled operations through a `WindowManagerPort`.  The port
//!   is the only way this layer touches the window manager; the sway client
//!   and the recording port in `infrastructure` both implement it.
//!
//! - **`list_layouts`** – Read-only inspection of a layout set: which layouts
//!   can be opened, and whether the whole file is valid.

pub mod list_layouts;
pub mod spawn_layout;
