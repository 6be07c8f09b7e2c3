//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::add::AddArgs;
use crate::commands::colors::ColorsAction;
use crate::commands::dashboard::DashboardArgs;
use crate::commands::edit::{DeleteArgs, EditArgs};
use crate::commands::export::ExportArgs;
use crate::commands::list::ListArgs;
use crate::commands::summary::SummaryArgs;
use crate::commands::timeline::TimelineArgs;

/// Personal time log dashboard.
///
/// Each entry records what you started doing and when. Durations are
/// derived from the gaps between entries and summarized by tag.
#[derive(Debug, Parser)]
#[command(name = "tl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List entries of a date range with their derived durations.
    List(ListArgs),

    /// Log a new activity.
    Add(AddArgs),

    /// Replace an existing entry.
    Edit(EditArgs),

    /// Delete an entry.
    Delete(DeleteArgs),

    /// Show how a date range splits across tags.
    Summary(SummaryArgs),

    /// Show the segments of one day.
    Timeline(TimelineArgs),

    /// Show the range summary and the day timeline together.
    Dashboard(DashboardArgs),

    /// Manage tag colors.
    Colors {
        #[command(subcommand)]
        action: ColorsAction,
    },

    /// Download all entries as CSV.
    Export(ExportArgs),
}
