//! Lecture items.

use serde::{Deserialize, Serialize};

/// One entry of an office feed: a reading, psalm, hymn or prayer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureItem {
    /// Stable identifier of the entry within the office.
    pub key: String,
    /// Full title.
    pub title: String,
    /// Short title, suitable for tabs. Same as `title` when the feed has none.
    pub short_title: String,
    /// Scripture or source reference, possibly empty.
    pub reference: String,
    /// HTML body.
    pub description: String,
}

impl LectureItem {
    /// Create an item with a title and an HTML body.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            short_title: title.clone(),
            title,
            description: description.into(),
            ..Default::default()
        }
    }
}
