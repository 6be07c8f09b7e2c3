//! Sortable, tag-filterable listing of entries with their durations.

use std::collections::BTreeSet;

use crate::derive::{DerivedEntry, derive};
use crate::entry::LogEntry;
use crate::types::CoreError;

/// Row order of the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// Filter and ordering applied to the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    /// Tags to keep. Empty keeps every row.
    pub tags: BTreeSet<String>,
    pub order: SortOrder,
}

impl TableQuery {
    /// Adds `tag` to the filter, or removes it if already selected.
    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.tags.remove(tag) {
            self.tags.insert(tag.to_string());
        }
    }

    fn keeps(&self, row: &DerivedEntry) -> bool {
        self.tags.is_empty() || self.tags.contains(row.entry.tag.trim())
    }
}

/// Distinct non-empty tags, sorted.
pub fn unique_tags(entries: &[LogEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Derives durations over all `entries`, then filters and orders the rows.
///
/// Filtering happens after derivation, so hiding a tag never changes the
/// duration shown for the remaining rows.
pub fn build_table(entries: &[LogEntry], query: &TableQuery) -> Result<Vec<DerivedEntry>, CoreError> {
    let mut rows: Vec<DerivedEntry> = derive(entries)?
        .into_iter()
        .filter(|row| query.keeps(row))
        .collect();
    if query.order == SortOrder::Descending {
        // Stable, so equal timestamps keep the order they have ascending.
        rows.sort_by(|a, b| b.entry.timestamp.cmp(&a.entry.timestamp));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    fn entry(minute: u32, activity: &str, tag: &str) -> LogEntry {
        LogEntry::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap(),
            activity,
            tag,
        )
    }

    fn entries() -> Vec<LogEntry> {
        vec![
            entry(30, "review", "work"),
            entry(0, "standup", "work"),
            entry(10, "coffee", "break"),
            entry(45, "notes", ""),
        ]
    }

    #[test]
    fn unique_tags_are_sorted_and_skip_empty() {
        assert_eq!(unique_tags(&entries()), vec!["break", "work"]);
        assert!(unique_tags(&[]).is_empty());
    }

    #[test]
    fn default_query_lists_newest_first() {
        let rows = build_table(&entries(), &TableQuery::default()).unwrap();
        let activities: Vec<&str> = rows.iter().map(|r| r.entry.activity.as_str()).collect();
        assert_eq!(activities, vec!["notes", "review", "coffee", "standup"]);
    }

    #[test]
    fn equal_timestamps_keep_their_order_in_both_directions() {
        let entries = vec![
            entry(0, "standup", "work"),
            entry(5, "first", "a"),
            entry(5, "second", "b"),
        ];
        let activities = |order| {
            let query = TableQuery {
                order,
                ..TableQuery::default()
            };
            build_table(&entries, &query)
                .unwrap()
                .into_iter()
                .map(|r| r.entry.activity)
                .collect::<Vec<_>>()
        };
        assert_eq!(activities(SortOrder::Ascending), vec!["standup", "first", "second"]);
        assert_eq!(activities(SortOrder::Descending), vec!["first", "second", "standup"]);
    }

    #[test]
    fn ascending_lists_oldest_first() {
        let query = TableQuery {
            order: SortOrder::Ascending,
            ..TableQuery::default()
        };
        let rows = build_table(&entries(), &query).unwrap();
        assert_eq!(rows[0].entry.activity, "standup");
        assert_eq!(rows[0].duration_secs, 0);
    }

    #[test]
    fn filtering_keeps_derived_durations() {
        let mut query = TableQuery::default();
        query.toggle_tag("work");
        let rows = build_table(&entries(), &query).unwrap();

        let summary: Vec<(&str, i64)> = rows
            .iter()
            .map(|r| (r.entry.activity.as_str(), r.duration_secs))
            .collect();
        // "review" claims 09:10-09:30 even though "coffee" is filtered out.
        assert_eq!(summary, vec![("review", 1200), ("standup", 0)]);
    }

    #[test]
    fn toggle_tag_adds_and_removes() {
        let mut query = TableQuery::default();
        query.toggle_tag("work");
        query.toggle_tag("break");
        assert_eq!(query.tags.len(), 2);
        query.toggle_tag("work");
        assert_eq!(query.tags.iter().collect::<Vec<_>>(), vec!["break"]);
    }
}
