//! Shared utilities for CLI commands.

use std::future::Future;
use std::sync::LazyLock;

use anyhow::{Context, bail};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use tl_client::ViewState;
use tl_core::timeline::local_midnight;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").expect("relative time regex is valid")
});

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Runs `future` to completion on a current-thread runtime.
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?;
    Ok(runtime.block_on(future))
}

/// Parses "N minutes/hours/days/weeks ago" into a duration.
fn parse_relative(s: &str) -> anyhow::Result<Option<Duration>> {
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        return Ok(None);
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        bail!("Relative time value too large: {n} {}", &caps[2]);
    }
    Ok(Some(Duration::minutes(n * minutes_per_unit)))
}

/// Parse a point in time relative to `now`.
///
/// Supports:
/// - `now`
/// - RFC 3339: "2026-01-15T10:30:00Z"
/// - Local time: "2026-01-15 10:30:00" or "2026-01-15T10:30:00"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime<Tz: TimeZone>(s: &str, now: &DateTime<Tz>) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Ok(now.with_timezone(&Utc));
    }
    if let Ok(dt) = tl_core::parse_timestamp_in(s, &now.timezone()) {
        return Ok(dt);
    }
    match parse_relative(s)? {
        Some(duration) => Ok(now.with_timezone(&Utc) - duration),
        None => bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        ),
    }
}

/// Parse a calendar day relative to `now`.
///
/// Supports `today`, `yesterday`, `YYYY-MM-DD`, RFC 3339 (converted to the
/// local day) and relative input such as "3 days ago".
pub fn parse_date<Tz: TimeZone>(s: &str, now: &DateTime<Tz>) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    let today = now.date_naive();
    match s.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&now.timezone()).date_naive());
    }
    match parse_relative(s)? {
        Some(duration) => Ok((now.clone() - duration).date_naive()),
        None => bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, 'today', 'yesterday' or relative (e.g., '3 days ago')"
        ),
    }
}

/// UTC bounds of the local days `start..=end`.
///
/// Missing ends default to the last `range_days` days including today. The
/// upper bound is the last second of `end`.
pub fn resolve_range<Tz: TimeZone>(
    start: Option<&str>,
    end: Option<&str>,
    range_days: u32,
    now: &DateTime<Tz>,
) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let end_day = end.map_or_else(|| Ok(now.date_naive()), |s| parse_date(s, now))?;
    let start_day = match start {
        Some(s) => parse_date(s, now)?,
        None => end_day - Duration::days(i64::from(range_days.max(1)) - 1),
    };
    if start_day > end_day {
        bail!("start date {start_day} is after end date {end_day}");
    }

    let tz = now.timezone();
    let range_start = local_midnight(start_day, &tz);
    let range_end = local_midnight(end_day + Duration::days(1), &tz) - Duration::seconds(1);
    Ok((range_start, range_end))
}

/// Turns a committed view state into its value, `None` for an empty view.
pub fn view_result<T>(state: ViewState<T>, what: &str) -> anyhow::Result<Option<T>> {
    match state {
        ViewState::Ready(value) => Ok(Some(value)),
        ViewState::Empty => Ok(None),
        ViewState::Failed(message) => bail!("failed to load {what}: {message}"),
        ViewState::Idle | ViewState::Loading => bail!("{what} was not loaded"),
    }
}
