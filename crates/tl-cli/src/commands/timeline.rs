//! Timeline command: the segments covering one local day.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate, SecondsFormat, TimeZone};
use clap::Args;
use serde::Serialize;
use tl_client::Dashboard;
use tl_core::{
    DayTimeline, Segment, SegmentKind, TagColors, format_duration, format_duration_simple,
};

use super::summary::{JsonTagTotal, percent, tag_color};
use super::util::{block_on, parse_date, view_result};
use crate::Config;

#[derive(Debug, Args)]
pub struct TimelineArgs {
    /// Day to show (default: today).
    #[arg(long)]
    pub date: Option<String>,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &TimelineArgs, config: &Config) -> Result<()> {
    let now = Local::now();
    let day = args
        .date
        .as_deref()
        .map_or_else(|| Ok(now.date_naive()), |s| parse_date(s, &now))?;

    let dashboard = Dashboard::new(config.client()?, Local);
    block_on(dashboard.load_timeline(day))?;
    let timeline = view_result(dashboard.timeline(), "timeline")?;

    if args.json {
        let colors = config.open_database()?.tag_colors()?;
        writeln!(
            writer,
            "{}",
            format_timeline_json(day, timeline.as_ref(), &colors)?
        )?;
    } else {
        write_timeline(writer, day, timeline.as_ref(), &Local)?;
    }
    Ok(())
}

/// Writes a day's segments followed by per-tag totals.
///
/// `None`, or a timeline with nothing but the day-start marker, is shown as
/// lacking data.
pub fn write_timeline<W: Write, Tz: TimeZone>(
    writer: &mut W,
    day: NaiveDate,
    timeline: Option<&DayTimeline>,
    tz: &Tz,
) -> std::io::Result<()>
where
    Tz::Offset: Display,
{
    writeln!(writer, "TIMELINE: {}", day.format("%A, %b %-d, %Y"))?;
    writeln!(writer)?;

    let Some(timeline) = timeline.filter(|timeline| timeline.has_enough_data()) else {
        writeln!(writer, "Not enough data to draw this day.")?;
        return Ok(());
    };

    for segment in &timeline.segments {
        let start = segment.start.with_timezone(tz).format("%H:%M:%S");
        match segment.kind {
            SegmentKind::DayStart => writeln!(writer, "{start}  {}", segment.activity)?,
            SegmentKind::Activity => {
                let end = segment.end.with_timezone(tz).format("%H:%M:%S");
                writeln!(
                    writer,
                    "{start}-{end}  {:>7}  {:<14}  {}",
                    format_duration_simple(segment.duration_secs()),
                    segment.tag_label(),
                    segment.activity
                )?;
            }
        }
    }

    let totals = timeline.totals_by_tag();
    writeln!(writer)?;
    writeln!(writer, "BY TAG")?;
    writeln!(writer, "──────")?;
    for total in totals.ranked() {
        writeln!(
            writer,
            "{:<16}  {:>8}",
            total.tag,
            format_duration(total.seconds)
        )?;
    }

    writeln!(writer)?;
    writeln!(
        writer,
        "Tracked: {} of {}",
        format_duration(totals.total()),
        format_duration((timeline.end - timeline.start).num_seconds())
    )?;
    Ok(())
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
pub struct JsonTimeline {
    pub day: String,
    pub enough_data: bool,
    pub segments: Vec<JsonSegment>,
    pub by_tag: Vec<JsonTagTotal>,
}

#[derive(Debug, Serialize)]
pub struct JsonSegment {
    pub start: String,
    pub end: String,
    pub duration_secs: i64,
    pub tag: String,
    pub activity: String,
    pub kind: SegmentKind,
    /// Absent for the day-start marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Formats a day timeline as JSON, with a color per tag.
pub fn format_timeline_json(
    day: NaiveDate,
    timeline: Option<&DayTimeline>,
    colors: &TagColors,
) -> Result<String> {
    let timeline = timeline.filter(|timeline| timeline.has_enough_data());
    let totals = timeline.map(DayTimeline::totals_by_tag).unwrap_or_default();
    let ranked = totals.ranked();
    let ordinal = |label: &str| ranked.iter().position(|total| total.tag == label);

    let segment_json = |segment: &Segment| JsonSegment {
        start: segment.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end: segment.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        duration_secs: segment.duration_secs(),
        tag: segment.tag.clone(),
        activity: segment.activity.clone(),
        kind: segment.kind,
        color: match segment.kind {
            SegmentKind::DayStart => None,
            SegmentKind::Activity => Some(
                colors
                    .resolve(&segment.tag, ordinal(segment.tag_label()).unwrap_or_default())
                    .to_string(),
            ),
        },
    };

    let output = JsonTimeline {
        day: day.to_string(),
        enough_data: timeline.is_some(),
        segments: timeline
            .map(|timeline| timeline.segments.iter().map(segment_json).collect())
            .unwrap_or_default(),
        by_tag: ranked
            .iter()
            .enumerate()
            .map(|(index, total)| JsonTagTotal {
                tag: total.tag.clone(),
                seconds: total.seconds,
                percent: percent(&totals, &total.tag),
                color: tag_color(colors, &total.tag, index).to_string(),
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&output)?)
}
