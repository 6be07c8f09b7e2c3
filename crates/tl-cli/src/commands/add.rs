//! Add command: log a new activity and show the day it lands in.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use tl_client::{ClientError, Dashboard, EntryStore, ViewState};
use tl_core::EntryDraft;

use super::timeline::write_timeline;
use super::util::{block_on, parse_datetime};
use crate::Config;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// What you started doing.
    pub activity: String,
    /// Tag for the activity (empty for none).
    #[arg(long, default_value = "")]
    pub tag: String,
    /// When the activity started (default: now).
    #[arg(long, value_name = "TIME")]
    pub at: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &AddArgs, config: &Config) -> Result<()> {
    let now = Local::now();
    let timestamp = args
        .at
        .as_deref()
        .map_or_else(|| Ok(now.to_utc()), |s| parse_datetime(s, &now))?;
    let draft = EntryDraft::new(timestamp, &args.activity, &args.tag)?;
    let day = timestamp.with_timezone(&Local).date_naive();

    let dashboard = Dashboard::new(config.client()?, Local);
    let id = block_on(async {
        let id = dashboard.create(&draft).await?;
        dashboard.load_timeline(day).await;
        Ok::<_, ClientError>(id)
    })?
    .context("failed to add entry")?;

    writeln!(writer, "Added entry {id}")?;
    write_refreshed_day(writer, &dashboard, day)
}

/// Writes the timeline reloaded after a change.
///
/// The change itself already succeeded, so a failed reload is reported
/// without failing the command.
pub fn write_refreshed_day<W: Write, S: EntryStore>(
    writer: &mut W,
    dashboard: &Dashboard<S, Local>,
    day: NaiveDate,
) -> Result<()> {
    writeln!(writer)?;
    match dashboard.timeline() {
        ViewState::Ready(timeline) => write_timeline(writer, day, Some(&timeline), &Local)?,
        ViewState::Failed(message) => {
            tracing::warn!(%day, %message, "could not refresh timeline");
            writeln!(writer, "Could not refresh the timeline: {message}")?;
        }
        _ => write_timeline(writer, day, None, &Local)?,
    }
    Ok(())
}
