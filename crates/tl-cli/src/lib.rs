//! Time log dashboard CLI library.
//!
//! This crate provides the `tl` command-line interface on top of the remote
//! store client and the local preference database.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
