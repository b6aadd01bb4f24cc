//! CLI command handlers

pub mod commands;

pub use commands::{keys, run, sheet};
