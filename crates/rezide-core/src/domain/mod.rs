//! Domain entities for rezide.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the application.  Domain code has no imports from OS
//! APIs, sockets, or the file system, so it can be compiled and tested on any
//! platform without a running window manager.
//!
//! The pipeline through this module is strictly one-way:
//!
//! ```text
//! LayoutSet ──validate/build──▶ Node ──schedule──▶ Vec<Operation>
//! ```

/// Raw layout definitions, validation, and tree resolution.
pub mod definitions;

/// The typed layout tree.
///
/// See [`node::Node`] for the main type.
pub mod node;

/// Linearization of a layout tree into window-manager operations.
pub mod schedule;
