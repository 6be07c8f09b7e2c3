//! Display colors per tag.
//!
//! Colors only affect presentation; durations and segments never depend on
//! them. The map is persisted as an opaque JSON object by the preference
//! store and handed to renderers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Color of entries without a tag.
pub const UNTAGGED_COLOR: &str = "#aaaaaa";

/// Fallback palette for tags without a chosen color.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// User-chosen colors keyed by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagColors(BTreeMap<String, String>);

impl TagColors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color chosen for `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    /// Sets the color for `tag`, returning the previous one.
    pub fn set(&mut self, tag: impl Into<String>, color: impl Into<String>) -> Option<String> {
        self.0.insert(tag.into(), color.into())
    }

    /// Forgets the color for `tag`.
    pub fn remove(&mut self, tag: &str) -> Option<String> {
        self.0.remove(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(tag, color)| (tag.as_str(), color.as_str()))
    }

    /// Color to draw `tag` with. `ordinal` is the tag's position among the
    /// tags being shown and picks the palette fallback.
    pub fn resolve(&self, tag: &str, ordinal: usize) -> &str {
        let tag = tag.trim();
        if tag.is_empty() {
            return UNTAGGED_COLOR;
        }
        self.get(tag)
            .unwrap_or(PALETTE[ordinal % PALETTE.len()])
    }
}
