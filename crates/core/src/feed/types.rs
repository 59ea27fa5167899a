use chrono::{DateTime, Utc};

/// The parts of a feed item a campaign is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// Whether `entry` was published since the previous poll.
///
/// Entries published strictly before `last_polled` are old. Entries without a
/// publication date or without a link are never new.
pub fn is_new_entry(entry: &FeedEntry, last_polled: DateTime<Utc>) -> bool {
    if entry.link.trim().is_empty() {
        return false;
    }
    entry
        .published
        .is_some_and(|published| published >= last_polled)
}
