//! Summary command: how the time of a date range splits across tags.
//!
//! This module implements `tl summary` with a human-readable ranking
//! (duration, bar relative to the largest tag, share of the total) and a JSON
//! form carrying the configured tag colors.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::Args;
use serde::Serialize;
use tl_client::{Dashboard, RangeView};
use tl_core::{TagColors, TagTotals, UNCATEGORIZED, format_duration};

use super::util::{block_on, resolve_range, view_result};
use crate::Config;

const BAR_WIDTH: i64 = 10;

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// First day to include (default: `range_days` ago).
    #[arg(long)]
    pub start: Option<String>,
    /// Last day to include (default: today).
    #[arg(long)]
    pub end: Option<String>,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Computed summary data.
#[derive(Debug)]
pub struct SummaryData {
    pub generated_at: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub entry_count: usize,
    pub totals: TagTotals,
}

impl SummaryData {
    /// Summary of a loaded range; `None` stands for a range without entries.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        view: Option<RangeView>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let (entry_count, totals) =
            view.map_or_else(|| (0, TagTotals::default()), |view| (view.entries.len(), view.totals));
        Self {
            generated_at,
            start,
            end,
            timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
            entry_count,
            totals,
        }
    }
}

pub fn run<W: Write>(writer: &mut W, args: &SummaryArgs, config: &Config) -> Result<()> {
    let now = Local::now();
    let (start, end) = resolve_range(
        args.start.as_deref(),
        args.end.as_deref(),
        config.range_days,
        &now,
    )?;

    let dashboard = Dashboard::new(config.client()?, Local);
    block_on(dashboard.load_range(start, end))?;
    let view = view_result(dashboard.range(), "entries")?;
    let data = SummaryData::new(start, end, view, now.with_timezone(&Utc));

    if args.json {
        let colors = config.open_database()?.tag_colors()?;
        writeln!(writer, "{}", format_summary_json(&data, &colors, &Local)?)?;
    } else {
        write_summary(writer, &data, &Local)?;
    }
    Ok(())
}

// ========== Progress Bar ==========

/// Generates a 10-character bar for `value` relative to `max`.
/// Non-zero values below 5% of max still get a single block.
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 {
        return "░".repeat(10);
    }

    let filled = if value > 0 && value * 20 < max {
        1
    } else {
        // round(value / max * 10) in integers
        ((value * BAR_WIDTH * 2 + max) / (max * 2)).clamp(0, BAR_WIDTH)
    };

    let filled = usize::try_from(filled).unwrap_or_default();
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Share of `total` as a whole percentage.
#[expect(
    clippy::cast_possible_truncation,
    reason = "a share is at most 1.0, so the percentage fits"
)]
pub fn percent(totals: &TagTotals, tag: &str) -> i64 {
    totals
        .share(tag)
        .map_or(0, |share| (share * 100.0).round() as i64)
}

/// Color to draw a ranked tag with.
///
/// Aggregated empty tags show as untagged unless a color was configured for
/// the `uncategorized` label itself.
pub fn tag_color<'a>(colors: &'a TagColors, label: &str, ordinal: usize) -> &'a str {
    let tag = if label == UNCATEGORIZED && colors.get(label).is_none() {
        ""
    } else {
        label
    };
    colors.resolve(tag, ordinal)
}

// ========== Text Output ==========

fn format_period<Tz: TimeZone>(data: &SummaryData, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let start = data.start.with_timezone(tz).date_naive();
    let end = data.end.with_timezone(tz).date_naive();
    if start == end {
        start.format("%A, %b %-d, %Y").to_string()
    } else {
        format!("{} - {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
    }
}

/// Writes the human-readable summary.
pub fn write_summary<W: Write, Tz: TimeZone>(
    writer: &mut W,
    data: &SummaryData,
    tz: &Tz,
) -> std::io::Result<()>
where
    Tz::Offset: Display,
{
    writeln!(writer, "TIME SUMMARY: {}", format_period(data, tz))?;

    if data.totals.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "No time recorded in this period.")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "Hint: Run 'tl add <activity>' to log what you are doing."
        )?;
        return Ok(());
    }

    let ranked = data.totals.ranked();
    let max = ranked.first().map_or(0, |top| top.seconds);

    writeln!(writer)?;
    writeln!(writer, "BY TAG")?;
    writeln!(writer, "──────")?;
    for total in &ranked {
        writeln!(
            writer,
            "{:<16}  {:>8}  {}  {:>3}%",
            total.tag,
            format_duration(total.seconds),
            progress_bar(total.seconds, max),
            percent(&data.totals, &total.tag)
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "SUMMARY")?;
    writeln!(writer, "───────")?;
    writeln!(
        writer,
        "Total tracked:  {}",
        format_duration(data.totals.total())
    )?;
    writeln!(writer, "Entries:        {}", data.entry_count)?;
    writeln!(writer, "Tags:           {}", ranked.len())?;
    Ok(())
}

// ========== JSON Output ==========

/// JSON summary structure.
#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub generated_at: String,
    pub timezone: String,
    pub period: JsonPeriod,
    pub by_tag: Vec<JsonTagTotal>,
    pub totals: JsonTotals,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize)]
pub struct JsonTagTotal {
    pub tag: String,
    pub seconds: i64,
    pub percent: i64,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct JsonTotals {
    pub seconds: i64,
    pub entry_count: usize,
}

/// Formats summary data as JSON.
pub fn format_summary_json<Tz: TimeZone>(
    data: &SummaryData,
    colors: &TagColors,
    tz: &Tz,
) -> Result<String> {
    let by_tag = data
        .totals
        .ranked()
        .into_iter()
        .enumerate()
        .map(|(ordinal, total)| JsonTagTotal {
            percent: percent(&data.totals, &total.tag),
            color: tag_color(colors, &total.tag, ordinal).to_string(),
            seconds: total.seconds,
            tag: total.tag,
        })
        .collect();

    let summary = JsonSummary {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: data.timezone.clone(),
        period: JsonPeriod {
            start: data.start.with_timezone(tz).date_naive().to_string(),
            end: data.end.with_timezone(tz).date_naive().to_string(),
        },
        by_tag,
        totals: JsonTotals {
            seconds: data.totals.total(),
            entry_count: data.entry_count,
        },
    };

    Ok(serde_json::to_string_pretty(&summary)?)
}
