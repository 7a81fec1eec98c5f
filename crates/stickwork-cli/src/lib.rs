//! Stickwork CLI library.
//!
//! Command implementations and logging setup for the `stickwork` binary.

pub mod commands;
pub mod logging;
