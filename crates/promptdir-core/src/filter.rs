//! Directory view filtering.
//!
//! Pure functions over an in-memory collection. Input order is preserved, so a
//! newest-first collection stays newest-first after filtering.

use std::collections::BTreeSet;

use crate::defaults::{ALL_TAGS, TAG_NAME_MAX_LENGTH};
use crate::models::{Record, RecordId};

/// Whether `tag_filter` selects every record.
fn matches_all_tags(tag_filter: &str) -> bool {
    let tag_filter = tag_filter.trim();
    tag_filter.is_empty() || tag_filter == ALL_TAGS
}

/// Case-insensitive substring match over title, body and tags.
///
/// `needle` must already be lowercased.
fn matches_search(record: &Record, needle: &str) -> bool {
    needle.is_empty()
        || record.title.to_lowercase().contains(needle)
        || record.body.to_lowercase().contains(needle)
        || record
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle))
}

/// Records matching both the tag filter and the search text.
///
/// A tag filter of `"All"` (or empty) matches every record; otherwise the
/// record must carry that exact tag.
pub fn filter_records(records: &[Record], tag_filter: &str, search_text: &str) -> Vec<Record> {
    let all_tags = matches_all_tags(tag_filter);
    let tag_filter = tag_filter.trim();
    let needle = search_text.trim().to_lowercase();

    records
        .iter()
        .filter(|r| all_tags || r.has_tag(tag_filter))
        .filter(|r| matches_search(r, &needle))
        .cloned()
        .collect()
}

/// Tag choices for the directory: `"All"` followed by every tag in use, sorted.
pub fn available_tags(records: &[Record]) -> Vec<String> {
    let tags: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.tags.iter().map(String::as_str))
        .collect();
    std::iter::once(ALL_TAGS.to_string())
        .chain(tags.into_iter().map(str::to_string))
        .collect()
}

/// Look up a record for the detail view.
pub fn find_record<'a>(records: &'a [Record], id: &RecordId) -> Option<&'a Record> {
    records.iter().find(|r| &r.id == id)
}

/// Normalize free-form tag input: trimmed, lowercased, de-duplicated, in
/// first-seen order. Over-long and empty entries are dropped.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().trim_start_matches('#').trim().to_lowercase();
        if tag.is_empty()
            || tag.chars().count() > TAG_NAME_MAX_LENGTH
            || tag == ALL_TAGS.to_lowercase()
        {
            continue;
        }
        if seen.insert(tag.clone()) {
            out.push(tag);
        }
    }
    out
}
