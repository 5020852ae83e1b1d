//! Infrastructure layer.
//!
//! Contains the adapters that touch the outside world: the config file on
//! disk and the window manager's IPC socket.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rezide_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`storage`** – Locates the layout file and decodes it into a
//!   `LayoutSet`.
//!
//! - **`window_manager`** – Implementations of `WindowManagerPort`: a
//!   blocking sway/i3 IPC client, and a recording port that applies nothing
//!   and remembers every call (used by `--dry-run` and tests).

pub mod storage;
pub mod window_manager;
