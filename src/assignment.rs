//! Which content items count as open assignments, and how close they are
//! to their deadline.

use core::fmt;

use chrono::NaiveDateTime;
use hashbrown::HashSet;
use serde::Serialize;

use crate::{
    content::ContentItem,
    util::{parse_time, truncate_to_minute},
};

/// Reading material is listed with a window too, but is never due.
pub const EXCLUDED_CATEGORY: &str = "資料";

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    Warning,
    Normal,
}

impl Urgency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Warning => "warning",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An assignment as handed to reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    #[serde(flatten)]
    pub item: ContentItem,
    pub urgency: Urgency,
}

fn in_window(item: &ContentItem, reference: NaiveDateTime) -> bool {
    let (Some(from), Some(to)) = (item.from.as_deref(), item.to.as_deref()) else {
        return false;
    };
    let (Some(from), Some(to)) = (parse_time(from), parse_time(to)) else {
        tracing::debug!(target: "assignment", "{}/{}: unreadable window {from:?} - {to:?}", item.subject, item.name);
        return false;
    };
    from < reference && reference < to
}

/// Items open at `reference` (strictly inside their window, compared at
/// minute resolution) that are not reading material.
pub fn select_assignments<'a, I>(items: I, reference: NaiveDateTime) -> Vec<ContentItem>
where
    I: IntoIterator<Item = &'a ContentItem>,
{
    let reference = truncate_to_minute(reference);
    items
        .into_iter()
        .filter(|item| item.category != EXCLUDED_CATEGORY && in_window(item, reference))
        .cloned()
        .collect()
}

/// Keeps the first record for each subject and name. Category is not part
/// of the key, so same-named items of different kinds collapse into one.
pub fn deduplicate(mut records: Vec<ContentItem>) -> Vec<ContentItem> {
    let mut seen = HashSet::new();
    records.retain(|r| seen.insert(format!("{}_{}", r.subject, r.name)));
    records
}

/// Stable, earliest deadline first; records without one go last. The page
/// format is fixed-width, so string order is time order.
pub fn sort_by_deadline(records: &mut [ContentItem]) {
    records.sort_by(|a, b| {
        let a = (a.to.is_none(), a.to.as_deref());
        let b = (b.to.is_none(), b.to.as_deref());
        a.cmp(&b)
    });
}

/// Whole days until `to`, rounded down.
pub fn days_left(record: &ContentItem, now: NaiveDateTime) -> Option<i64> {
    let due = parse_time(record.to.as_deref()?)?;
    Some((due - now).num_seconds().div_euclid(SECONDS_PER_DAY))
}

pub fn urgency_of(record: &ContentItem, now: NaiveDateTime) -> Urgency {
    match days_left(record, now) {
        Some(..=3) => Urgency::Urgent,
        Some(..=7) => Urgency::Warning,
        _ => Urgency::Normal,
    }
}

/// The whole filter: select, deduplicate, sort.
pub fn collect_assignments<'a, I>(items: I, reference: NaiveDateTime) -> Vec<ContentItem>
where
    I: IntoIterator<Item = &'a ContentItem>,
{
    let mut records = deduplicate(select_assignments(items, reference));
    sort_by_deadline(&mut records);
    tracing::info!(target: "assignment", "found {} assignments", records.len());
    records
}
