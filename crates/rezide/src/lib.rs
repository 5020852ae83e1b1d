//! rezide library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does rezide do? (for beginners)
//!
//! A tiling window manager such as sway or i3 places every new window by
//! splitting whatever currently has focus.  Getting a particular arrangement
//! ("editor on the left, two terminals stacked on the right") therefore means
//! issuing the right commands in the right order, every time.
//!
//! rezide reads named layouts from a TOML file and does that for you:
//!
//! 1. The config file is located and decoded into a `LayoutSet`
//!    (`infrastructure::storage::config`).
//! 2. The whole set is validated and the requested layout is resolved into a
//!    tree (`rezide_core::domain::definitions`).
//! 3. The tree is linearized into make / focus / split operations
//!    (`rezide_core::domain::schedule`).
//! 4. The operations are applied one at a time through a
//!    `WindowManagerPort` (`application::spawn_layout`), which the sway IPC
//!    client implements (`infrastructure::window_manager::sway`).

/// Application layer: use cases.
pub mod application;

/// Infrastructure layer: config files and window-manager adapters.
pub mod infrastructure;
