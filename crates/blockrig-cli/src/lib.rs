//! Blockrig CLI library.
//!
//! This crate provides the core functionality for the Blockrig CLI:
//! document loading, logging setup, and the `normalize` and `plan` commands.

pub mod commands;
pub mod input;
pub mod logging;
