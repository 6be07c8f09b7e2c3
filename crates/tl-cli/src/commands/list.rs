//! List command: entries of a date range with the time each one claims.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Args;
use tl_client::Dashboard;
use tl_core::table::{SortOrder, TableQuery, build_table, unique_tags};
use tl_core::{DerivedEntry, format_duration};

use super::util::{block_on, resolve_range, view_result};
use crate::Config;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// First day to include (default: `range_days` ago).
    #[arg(long)]
    pub start: Option<String>,
    /// Last day to include (default: today).
    #[arg(long)]
    pub end: Option<String>,
    /// Only show entries with this tag. Repeat to select several.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Oldest entries first.
    #[arg(long)]
    pub asc: bool,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    fn query(&self) -> TableQuery {
        let mut query = TableQuery {
            order: if self.asc {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            },
            ..TableQuery::default()
        };
        for tag in &self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !query.tags.contains(tag) {
                query.toggle_tag(tag);
            }
        }
        query
    }
}

pub fn run<W: Write>(writer: &mut W, args: &ListArgs, config: &Config) -> Result<()> {
    let now = Local::now();
    let (start, end) = resolve_range(
        args.start.as_deref(),
        args.end.as_deref(),
        config.range_days,
        &now,
    )?;

    let dashboard = Dashboard::new(config.client()?, Local);
    block_on(dashboard.load_range(start, end))?;
    let entries = view_result(dashboard.range(), "entries")?
        .map(|view| view.entries)
        .unwrap_or_default();

    let rows = build_table(&entries, &args.query())?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
    } else {
        write_table(writer, &rows, &unique_tags(&entries), &Local)?;
    }
    Ok(())
}

/// Writes rows as an aligned table followed by a total.
pub fn write_table<W: Write, Tz: TimeZone>(
    writer: &mut W,
    rows: &[DerivedEntry],
    tags: &[String],
    tz: &Tz,
) -> std::io::Result<()>
where
    Tz::Offset: Display,
{
    if rows.is_empty() {
        writeln!(writer, "No entries found.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<16}  {:>8}  {:<14}  ACTIVITY",
        "TIME", "DURATION", "TAG"
    )?;
    for row in rows {
        let time = row
            .entry
            .timestamp
            .with_timezone(tz)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        writeln!(
            writer,
            "{time:<16}  {:>8}  {:<14}  {}",
            format_duration(row.duration_secs),
            row.entry.tag_label(),
            row.entry.activity
        )?;
    }

    let total: i64 = rows.iter().map(|row| row.duration_secs).sum();
    writeln!(writer)?;
    writeln!(
        writer,
        "{} entries, {} tracked",
        rows.len(),
        format_duration(total)
    )?;
    if !tags.is_empty() {
        writeln!(writer, "Tags: {}", tags.join(", "))?;
    }
    Ok(())
}
