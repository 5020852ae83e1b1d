//! Storage infrastructure: the layout file.
//!
//! The `config` sub-module decides which file to read, reads it, and decodes
//! the TOML into a `LayoutSet`.  Nothing is ever written back.

pub mod config;
