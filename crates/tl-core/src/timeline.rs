//! Day timeline segmentation.
//!
//! Turns a window of point entries into the segments that cover a single
//! local day.
//!
//! # Algorithm Summary
//!
//! 1. Sort the window (the previous day through the day after the target).
//! 2. Emit a zero-length day-start marker at local midnight.
//! 3. Each entry governs `[entry, next entry)`; clip that interval to the day
//!    and keep it if anything is left.
//! 4. If the last segment runs into midnight, relabel it with the first entry
//!    after midnight and end it one second early, so the boundary shows the
//!    activity that is about to start.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::derive::{TagTotals, sort_entries};
use crate::entry::{LogEntry, tag_label};

/// Tag of the synthetic day-start marker.
pub const START_MARKER_TAG: &str = "start-marker";

/// Activity of the synthetic day-start marker.
pub const START_MARKER_ACTIVITY: &str = "day start";

/// What a segment represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Zero-length anchor at the start of the day.
    DayStart,
    /// Time governed by a logged entry.
    Activity,
}

/// A clipped interval of a day timeline. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tag: String,
    pub activity: String,
    pub kind: SegmentKind,
}

impl Segment {
    fn day_start(at: DateTime<Utc>) -> Self {
        Self {
            start: at,
            end: at,
            tag: START_MARKER_TAG.to_string(),
            activity: START_MARKER_ACTIVITY.to_string(),
            kind: SegmentKind::DayStart,
        }
    }

    /// Length of the segment in whole seconds.
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// Tag for grouping and display; see [`crate::tag_label`].
    pub fn tag_label(&self) -> &str {
        tag_label(&self.tag)
    }
}

/// Segments covering one local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTimeline {
    pub day: NaiveDate,
    /// Local midnight at the start of `day`.
    pub start: DateTime<Utc>,
    /// Local midnight at the start of the following day.
    pub end: DateTime<Utc>,
    /// The day-start marker followed by activity segments in order.
    pub segments: Vec<Segment>,
}

impl DayTimeline {
    /// False when nothing but the day-start marker was produced. Such a day
    /// should be shown as lacking data rather than drawn.
    pub fn has_enough_data(&self) -> bool {
        self.segments.len() >= 2
    }

    pub fn activity_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|segment| segment.kind == SegmentKind::Activity)
    }

    /// Seconds of the day covered by each tag.
    pub fn totals_by_tag(&self) -> TagTotals {
        self.activity_segments()
            .map(|segment| (segment.tag_label().to_string(), segment.duration_secs()))
            .collect()
    }
}

/// Converts local midnight of `day` in `tz` to UTC.
///
/// An ambiguous midnight (DST fall-back) resolves to the earlier instant; a
/// midnight skipped by a DST jump resolves to 01:00 local.
pub fn local_midnight<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let one_am = midnight + Duration::hours(1);
            tz.from_local_datetime(&one_am)
                .earliest()
                .map_or_else(|| one_am.and_utc(), |dt| dt.with_timezone(&Utc))
        }
    }
}

/// Half-open UTC bounds of a local day.
pub fn day_bounds<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        local_midnight(day, tz),
        local_midnight(day + Duration::days(1), tz),
    )
}

/// Bounds of the entries needed to segment `day`: from the start of the
/// previous day to the end of the following day.
pub fn window_bounds<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        local_midnight(day - Duration::days(1), tz),
        local_midnight(day + Duration::days(2), tz),
    )
}

/// Builds the segments covering `day` from a window of entries.
///
/// `window` should hold everything in [`window_bounds`] so that the
/// activities running at both midnights can be resolved; it does not need
/// to be sorted. Entries whose governed interval misses the day produce no
/// segment, and periods not governed by any entry stay uncovered.
pub fn build_day_segments<Tz: TimeZone>(
    window: &[LogEntry],
    day: NaiveDate,
    tz: &Tz,
) -> DayTimeline {
    let sorted = sort_entries(window);
    let (start, end) = day_bounds(day, tz);

    let mut segments = vec![Segment::day_start(start)];
    for (index, current) in sorted.iter().enumerate() {
        let governed_end = sorted.get(index + 1).map_or(end, |next| next.timestamp);
        let overlap_start = current.timestamp.max(start);
        let overlap_end = governed_end.min(end);
        if overlap_start < overlap_end {
            segments.push(Segment {
                start: overlap_start,
                end: overlap_end,
                tag: current.tag.clone(),
                activity: current.activity.clone(),
                kind: SegmentKind::Activity,
            });
        }
    }

    relabel_midnight_segment(&mut segments, &sorted, end);

    tracing::debug!(
        %day,
        entries = sorted.len(),
        segments = segments.len(),
        "built day timeline"
    );

    DayTimeline {
        day,
        start,
        end,
        segments,
    }
}

/// Presentation fix for the segment that runs into midnight.
///
/// Only the first entry strictly after `day_end` qualifies, so an entry at
/// exactly midnight is passed over. Without such an entry, or when the
/// segment starts within the last second of the day, it keeps ending at
/// midnight.
fn relabel_midnight_segment(segments: &mut [Segment], sorted: &[LogEntry], day_end: DateTime<Utc>) {
    if segments.len() < 2 {
        return;
    }
    let Some(last) = segments.last_mut() else {
        return;
    };
    if last.end != day_end {
        return;
    }
    let Some(next) = sorted.iter().find(|entry| entry.timestamp > day_end) else {
        tracing::debug!("no entry after midnight, keeping last segment as is");
        return;
    };
    let last_second = day_end - Duration::seconds(1);
    if last.start >= last_second {
        tracing::debug!(start = %last.start, "segment too short to relabel");
        return;
    }

    last.end = last_second;
    last.tag.clone_from(&next.tag);
    last.activity.clone_from(&next.activity);
    tracing::debug!(tag = %last.tag, "relabeled segment ending at midnight");
}
