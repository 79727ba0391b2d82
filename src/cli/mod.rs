//! CLI module for formlens.
//!
//! Defines command-line argument parsing and the command implementations.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};
