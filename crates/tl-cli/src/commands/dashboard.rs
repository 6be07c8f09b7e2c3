//! Dashboard command: range summary and day timeline side by side.
//!
//! Both views are fetched concurrently through one [`Dashboard`], the same
//! way an interactive frontend would load them. Each view is rendered from
//! its own committed state, so one failing view does not hide the other.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Result, bail};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use tl_client::{Dashboard, RangeView, ViewState};
use tl_core::DayTimeline;

use super::summary::{SummaryData, write_summary};
use super::timeline::write_timeline;
use super::util::{block_on, parse_date, resolve_range};
use crate::Config;

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// First day of the summary range (default: `range_days` ago).
    #[arg(long)]
    pub start: Option<String>,
    /// Last day of the summary range (default: today).
    #[arg(long)]
    pub end: Option<String>,
    /// Day drawn as a timeline (default: today).
    #[arg(long)]
    pub date: Option<String>,
}

/// Everything the dashboard shows, as committed by the fetches.
#[derive(Debug)]
pub struct DashboardView {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub day: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub range: ViewState<RangeView>,
    pub timeline: ViewState<DayTimeline>,
}

impl DashboardView {
    fn failures(&self) -> usize {
        usize::from(matches!(self.range, ViewState::Failed(_)))
            + usize::from(matches!(self.timeline, ViewState::Failed(_)))
    }
}

pub fn run<W: Write>(writer: &mut W, args: &DashboardArgs, config: &Config) -> Result<()> {
    let now = Local::now();
    let (start, end) = resolve_range(
        args.start.as_deref(),
        args.end.as_deref(),
        config.range_days,
        &now,
    )?;
    let day = args
        .date
        .as_deref()
        .map_or_else(|| Ok(now.date_naive()), |s| parse_date(s, &now))?;

    let dashboard = Dashboard::new(config.client()?, Local);
    block_on(async {
        tokio::join!(dashboard.load_range(start, end), dashboard.load_timeline(day))
    })?;

    let view = DashboardView {
        start,
        end,
        day,
        generated_at: now.to_utc(),
        range: dashboard.range(),
        timeline: dashboard.timeline(),
    };
    write_dashboard(writer, view, &Local)
}

/// Writes both sections, failing afterwards if any view could not load.
pub fn write_dashboard<W: Write, Tz: TimeZone>(
    writer: &mut W,
    view: DashboardView,
    tz: &Tz,
) -> Result<()>
where
    Tz::Offset: Display,
{
    let failures = view.failures();

    match view.range {
        ViewState::Failed(message) => {
            writeln!(writer, "TIME SUMMARY")?;
            writeln!(writer)?;
            writeln!(writer, "Could not load entries: {message}")?;
        }
        ViewState::Ready(range) => {
            let data = SummaryData::new(view.start, view.end, Some(range), view.generated_at);
            write_summary(writer, &data, tz)?;
        }
        _ => {
            let data = SummaryData::new(view.start, view.end, None, view.generated_at);
            write_summary(writer, &data, tz)?;
        }
    }

    writeln!(writer)?;
    match view.timeline {
        ViewState::Failed(message) => {
            writeln!(writer, "TIMELINE: {}", view.day.format("%A, %b %-d, %Y"))?;
            writeln!(writer)?;
            writeln!(writer, "Could not load timeline: {message}")?;
        }
        ViewState::Ready(timeline) => write_timeline(writer, view.day, Some(&timeline), tz)?,
        _ => write_timeline(writer, view.day, None, tz)?,
    }

    if failures > 0 {
        bail!("{failures} dashboard view(s) failed to load");
    }
    Ok(())
}
