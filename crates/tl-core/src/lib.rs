//! Core domain logic for the time log dashboard.
//!
//! This crate contains the fundamental types and logic for:
//! - Derivation: turning point entries into durations and per-tag totals
//! - Timeline: segmenting one local day, including the midnight boundary
//! - Table: sorting and filtering entries for listing
//! - Formatting and tag colors used by the views

pub mod colors;
mod derive;
mod entry;
pub mod format;
pub mod table;
pub mod timeline;
mod types;

pub use colors::TagColors;
pub use derive::{
    DerivedEntry, TagTotal, TagTotals, aggregate_by_tag, derive, interval_secs, sort_entries,
    total_span_secs,
};
pub use entry::{
    EntryDraft, LogEntry, UNCATEGORIZED, format_timestamp, parse_timestamp, parse_timestamp_in,
    tag_label,
};
pub use format::{format_duration, format_duration_simple};
pub use timeline::{DayTimeline, Segment, SegmentKind, build_day_segments, day_bounds, window_bounds};
pub use types::{CoreError, EntryId, ValidationError};
