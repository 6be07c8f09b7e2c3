//! Duration derivation and per-tag aggregation.
//!
//! The store only knows when each activity started. The time an entry
//! "claims" is the gap since the previous entry, so every computation here
//! starts by sorting the entries by timestamp.
//!
//! # Gap attribution
//!
//! For consecutive entries `prev` and `curr`, the gap `curr - prev` belongs to
//! `curr`: the entry describes the activity that was going on during the gap
//! leading up to it. The first entry of a sequence therefore claims nothing.

use std::collections::HashMap;

use serde::Serialize;

use crate::entry::LogEntry;
use crate::types::CoreError;

/// A log entry together with the duration it claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedEntry {
    #[serde(flatten)]
    pub entry: LogEntry,
    /// Seconds since the previous entry; 0 for the first entry.
    pub duration_secs: i64,
}

/// Returns a copy of `entries` sorted ascending by timestamp.
///
/// The sort is stable: entries with identical timestamps keep their input
/// order.
pub fn sort_entries(entries: &[LogEntry]) -> Vec<LogEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|entry| entry.timestamp);
    sorted
}

/// Whole seconds between two entries.
///
/// Computed from epoch seconds so that consecutive gaps always add up to the
/// gap between the outermost entries.
pub fn interval_secs(previous: &LogEntry, current: &LogEntry) -> Result<i64, CoreError> {
    let seconds = current.timestamp.timestamp() - previous.timestamp.timestamp();
    if seconds < 0 {
        return Err(CoreError::AnomalousInterval {
            previous: previous.timestamp,
            current: current.timestamp,
            seconds,
        });
    }
    Ok(seconds)
}

/// Sorts `entries` and attaches the duration each one claims.
///
/// The input is left untouched; the returned vector has the same length.
pub fn derive(entries: &[LogEntry]) -> Result<Vec<DerivedEntry>, CoreError> {
    derive_sorted(sort_entries(entries))
}

fn derive_sorted(sorted: Vec<LogEntry>) -> Result<Vec<DerivedEntry>, CoreError> {
    let mut durations = vec![0; sorted.len()];
    for (index, pair) in sorted.windows(2).enumerate() {
        durations[index + 1] = interval_secs(&pair[0], &pair[1])?;
    }

    Ok(sorted
        .into_iter()
        .zip(durations)
        .map(|(entry, duration_secs)| DerivedEntry {
            entry,
            duration_secs,
        })
        .collect())
}

/// Seconds between the earliest and the latest entry, or 0 for fewer than
/// two entries.
pub fn total_span_secs(entries: &[LogEntry]) -> i64 {
    let first = entries.iter().map(|entry| entry.timestamp).min();
    let last = entries.iter().map(|entry| entry.timestamp).max();
    match (first, last) {
        (Some(first), Some(last)) => last.timestamp() - first.timestamp(),
        _ => 0,
    }
}

/// Total seconds for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagTotal {
    pub tag: String,
    pub seconds: i64,
}

/// Seconds claimed per tag. Iteration order carries no meaning; use
/// [`TagTotals::ranked`] for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagTotals(HashMap<String, i64>);

impl TagTotals {
    /// Seconds recorded for `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<i64> {
        self.0.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum over all tags.
    pub fn total(&self) -> i64 {
        self.0.values().sum()
    }

    /// Fraction of the total claimed by `tag`, in `[0.0, 1.0]`.
    #[expect(
        clippy::cast_precision_loss,
        reason = "second counts stay far below 2^52"
    )]
    pub fn share(&self, tag: &str) -> Option<f64> {
        let total = self.total();
        if total <= 0 {
            return None;
        }
        self.get(tag).map(|seconds| seconds as f64 / total as f64)
    }

    /// Tags ordered by total descending, ties broken by tag name.
    pub fn ranked(&self) -> Vec<TagTotal> {
        let mut ranked: Vec<TagTotal> = self
            .0
            .iter()
            .map(|(tag, seconds)| TagTotal {
                tag: tag.clone(),
                seconds: *seconds,
            })
            .collect();
        ranked.sort_by(|a, b| b.seconds.cmp(&a.seconds).then_with(|| a.tag.cmp(&b.tag)));
        ranked
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(tag, seconds)| (tag.as_str(), *seconds))
    }
}

impl FromIterator<(String, i64)> for TagTotals {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut totals: HashMap<String, i64> = HashMap::new();
        for (tag, seconds) in iter {
            *totals.entry(tag).or_default() += seconds;
        }
        totals.retain(|_, seconds| *seconds > 0);
        Self(totals)
    }
}

/// Sums the gap each entry claims into its tag.
///
/// Fewer than two entries yield empty totals. Empty tags are grouped under
/// [`crate::UNCATEGORIZED`], and tags whose total is not positive are left
/// out.
pub fn aggregate_by_tag(entries: &[LogEntry]) -> Result<TagTotals, CoreError> {
    if entries.len() < 2 {
        return Ok(TagTotals::default());
    }

    let totals: TagTotals = derive(entries)?
        .into_iter()
        .skip(1)
        .map(|derived| {
            (
                derived.entry.tag_label().to_string(),
                derived.duration_secs,
            )
        })
        .collect();

    tracing::debug!(tags = totals.len(), "aggregated durations by tag");
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, TimeZone, Utc};

    use crate::UNCATEGORIZED;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, minute, 0).unwrap()
    }

    fn entry(hour: u32, minute: u32, activity: &str, tag: &str) -> LogEntry {
        LogEntry::new(at(hour, minute), activity, tag)
    }

    fn sample() -> Vec<LogEntry> {
        vec![
            entry(10, 0, "emails", "work"),
            entry(10, 30, "coffee", "break"),
            entry(11, 0, "review", "work"),
        ]
    }

    #[test]
    fn derive_empty_and_single() {
        assert!(derive(&[]).unwrap().is_empty());

        let single = derive(&[entry(9, 0, "alone", "x")]).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].duration_secs, 0);
    }

    #[test]
    fn derive_claims_gap_since_previous() {
        let derived = derive(&sample()).unwrap();
        let durations: Vec<i64> = derived.iter().map(|d| d.duration_secs).collect();
        assert_eq!(durations, vec![0, 1800, 1800]);
    }

    #[test]
    fn derive_sorts_unsorted_input_without_touching_it() {
        let mut input = sample();
        input.reverse();
        let snapshot = input.clone();

        let derived = derive(&input).unwrap();

        assert_eq!(input, snapshot);
        assert_eq!(derived[0].entry.activity, "emails");
        assert_eq!(derived[2].entry.activity, "review");
    }

    #[test]
    fn derive_durations_telescope() {
        let entries = vec![
            entry(8, 5, "a", "x"),
            entry(13, 47, "b", "y"),
            entry(9, 12, "c", "x"),
            entry(23, 59, "d", ""),
            entry(9, 12, "e", "z"),
        ];
        let derived = derive(&entries).unwrap();
        let sum: i64 = derived.iter().map(|d| d.duration_secs).sum();
        assert_eq!(sum, total_span_secs(&entries));
        assert_eq!(sum, at(23, 59).timestamp() - at(8, 5).timestamp());
    }

    #[test]
    fn derive_telescopes_with_subsecond_timestamps() {
        let base = at(10, 0);
        let entries = vec![
            LogEntry::new(base + chrono::Duration::milliseconds(900), "a", "x"),
            LogEntry::new(base + chrono::Duration::milliseconds(1_100), "b", "x"),
            LogEntry::new(base + chrono::Duration::milliseconds(2_950), "c", "x"),
        ];
        let sum: i64 = derive(&entries)
            .unwrap()
            .iter()
            .map(|d| d.duration_secs)
            .sum();
        assert_eq!(sum, total_span_secs(&entries));
    }

    #[test]
    fn derive_is_order_independent() {
        let forward = sample();
        let permutations = [
            vec![forward[2].clone(), forward[0].clone(), forward[1].clone()],
            vec![forward[1].clone(), forward[2].clone(), forward[0].clone()],
            vec![forward[2].clone(), forward[1].clone(), forward[0].clone()],
        ];
        let expected = derive(&forward).unwrap();
        for permutation in permutations {
            assert_eq!(derive(&permutation).unwrap(), expected);
        }
    }

    #[test]
    fn derive_keeps_input_order_for_equal_timestamps() {
        let entries = vec![
            entry(10, 0, "first", "a"),
            entry(10, 0, "second", "b"),
            entry(9, 0, "earlier", "c"),
        ];
        let derived = derive(&entries).unwrap();
        let order: Vec<&str> = derived.iter().map(|d| d.entry.activity.as_str()).collect();
        assert_eq!(order, vec!["earlier", "first", "second"]);
        assert_eq!(derived[2].duration_secs, 0);
    }

    #[test]
    fn interval_secs_flags_negative_gaps() {
        let later = entry(11, 0, "later", "x");
        let earlier = entry(10, 0, "earlier", "x");
        let err = interval_secs(&later, &earlier).unwrap_err();
        assert_eq!(
            err,
            CoreError::AnomalousInterval {
                previous: at(11, 0),
                current: at(10, 0),
                seconds: -3600,
            }
        );
    }

    #[test]
    fn aggregate_attributes_gap_to_later_entry() {
        let totals = aggregate_by_tag(&sample()).unwrap();
        assert_eq!(totals.get("work"), Some(1800));
        assert_eq!(totals.get("break"), Some(1800));
        assert_eq!(totals.len(), 2);
        assert_eq!(totals.total(), 3600);
    }

    #[test]
    fn aggregate_needs_two_entries() {
        assert!(aggregate_by_tag(&[]).unwrap().is_empty());
        assert!(
            aggregate_by_tag(&[entry(10, 0, "solo", "work")])
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn aggregate_partitions_the_span() {
        let entries = vec![
            entry(7, 0, "wake", ""),
            entry(7, 45, "commute", "travel"),
            entry(8, 30, "deep work", "work"),
            entry(12, 0, "lunch", "break"),
            entry(12, 40, "meetings", "work"),
            entry(17, 10, "gym", "health"),
        ];
        let totals = aggregate_by_tag(&entries).unwrap();
        assert_eq!(totals.total(), total_span_secs(&entries));
        // 07:45-08:30 and 12:00-12:40 lead up to the two "work" entries.
        assert_eq!(totals.get("work"), Some(45 * 60 + 40 * 60));
        assert_eq!(totals.get("health"), Some(4 * 3600 + 30 * 60));
        // The first entry claims nothing, so its empty tag never shows up.
        assert_eq!(totals.get(UNCATEGORIZED), None);
    }

    #[test]
    fn aggregate_buckets_empty_tags() {
        let entries = vec![entry(9, 0, "a", "work"), entry(9, 20, "b", "  ")];
        let totals = aggregate_by_tag(&entries).unwrap();
        assert_eq!(totals.get(UNCATEGORIZED), Some(1200));
    }

    #[test]
    fn aggregate_drops_zero_totals() {
        let entries = vec![
            entry(9, 0, "a", "work"),
            entry(9, 0, "duplicate", "ghost"),
            entry(9, 30, "b", "work"),
        ];
        let totals = aggregate_by_tag(&entries).unwrap();
        assert_eq!(totals.get("ghost"), None);
        assert_eq!(totals.get("work"), Some(1800));
    }

    #[test]
    fn ranked_sorts_by_total_then_name() {
        let entries = vec![
            entry(9, 0, "start", ""),
            entry(9, 10, "a", "beta"),
            entry(9, 20, "b", "alpha"),
            entry(10, 0, "c", "gamma"),
        ];
        let ranked = aggregate_by_tag(&entries).unwrap().ranked();
        let tags: Vec<&str> = ranked.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, vec!["gamma", "alpha", "beta"]);
    }

    #[test]
    fn share_is_fraction_of_total() {
        let totals = aggregate_by_tag(&sample()).unwrap();
        let share = totals.share("work").unwrap();
        assert!((share - 0.5).abs() < f64::EPSILON);
        assert_eq!(totals.share("missing"), None);
        assert_eq!(TagTotals::default().share("work"), None);
    }
}
