//! Human-readable durations.

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Below this, durations are shown in hours and minutes.
const HOURS_FORMAT_LIMIT: i64 = 48 * HOUR;
/// Below this, durations are shown in days and hours; above, in days only.
const DAYS_AND_HOURS_LIMIT: i64 = 168 * HOUR;

/// Shown for negative durations.
pub const INVALID_DURATION: &str = "invalid";

/// Formats seconds for tables and summaries.
///
/// - under 48h: `"3h 5m"`, `"3h"` or `"5m"` (minutes floored)
/// - 48h up to 168h: `"2d 7h"` or `"2d"` (hours rounded)
/// - 168h and above: `"9d"` (days rounded)
pub fn format_duration(total_secs: i64) -> String {
    if total_secs < 0 {
        return INVALID_DURATION.to_string();
    }
    if total_secs == 0 {
        return "0m".to_string();
    }

    if total_secs < HOURS_FORMAT_LIMIT {
        let hours = total_secs / HOUR;
        let minutes = (total_secs % HOUR) / MINUTE;
        return match (hours, minutes) {
            (0, minutes) => format!("{minutes}m"),
            (hours, 0) => format!("{hours}h"),
            (hours, minutes) => format!("{hours}h {minutes}m"),
        };
    }

    if total_secs < DAYS_AND_HOURS_LIMIT {
        let mut days = total_secs / DAY;
        let mut hours = (total_secs % DAY + HOUR / 2) / HOUR;
        if hours == 24 {
            days += 1;
            hours = 0;
        }
        return if hours > 0 {
            format!("{days}d {hours}h")
        } else {
            format!("{days}d")
        };
    }

    let days = (total_secs + DAY / 2) / DAY;
    format!("{days}d")
}

/// Compact format for timeline segments: `"1h 05m"`, `"4m 09s"` or `"42s"`.
pub fn format_duration_simple(total_secs: i64) -> String {
    if total_secs < 0 {
        return INVALID_DURATION.to_string();
    }
    let minutes = total_secs / MINUTE;
    let seconds = total_secs % MINUTE;
    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;

    if hours > 0 {
        format!("{hours}h {remaining_minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
