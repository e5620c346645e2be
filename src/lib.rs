//! Shelf application library
//!
//! Application modules plus the bootstrap that wires them to the database and
//! the HTTP server.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::{prepare, run, App};
