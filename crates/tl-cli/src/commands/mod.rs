//! CLI subcommand implementations.

pub mod add;
pub mod colors;
pub mod dashboard;
pub mod edit;
pub mod export;
pub mod list;
pub mod summary;
pub mod timeline;
mod util;
