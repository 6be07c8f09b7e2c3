//! Edit and delete commands for stored entries.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use tl_client::{ClientError, Dashboard};
use tl_core::{EntryDraft, EntryId};

use super::add::write_refreshed_day;
use super::util::{block_on, parse_datetime};
use crate::Config;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Identifier of the entry to replace.
    pub id: String,
    /// New activity text.
    pub activity: String,
    /// New start time.
    #[arg(long, value_name = "TIME")]
    pub at: String,
    /// New tag (empty for none).
    #[arg(long, default_value = "")]
    pub tag: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Identifier of the entry to delete.
    pub id: String,
}

pub fn run<W: Write>(writer: &mut W, args: &EditArgs, config: &Config) -> Result<()> {
    let id = EntryId::new(args.id.trim())?;
    let now = Local::now();
    let timestamp = parse_datetime(&args.at, &now)?;
    let draft = EntryDraft::new(timestamp, &args.activity, &args.tag)?;
    let day = timestamp.with_timezone(&Local).date_naive();

    let dashboard = Dashboard::new(config.client()?, Local);
    block_on(async {
        dashboard.update(&id, &draft).await?;
        dashboard.load_timeline(day).await;
        Ok::<_, ClientError>(())
    })?
    .with_context(|| format!("failed to update entry {id}"))?;

    writeln!(writer, "Updated entry {id}")?;
    write_refreshed_day(writer, &dashboard, day)
}

pub fn delete<W: Write>(writer: &mut W, args: &DeleteArgs, config: &Config) -> Result<()> {
    let id = EntryId::new(args.id.trim())?;
    let dashboard = Dashboard::new(config.client()?, Local);
    block_on(dashboard.delete(&id))?.with_context(|| format!("failed to delete entry {id}"))?;
    writeln!(writer, "Deleted entry {id}")?;
    Ok(())
}
