use compact_str::format_compact;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Deserialize)]
struct Feed {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct Record {
    #[serde(default)]
    message: Option<String>,
}

/// Message bodies of the timeline feed, in feed order. Records without a
/// body are dropped.
pub fn parse_messages(json: &str) -> Result<Vec<String>> {
    let feed = serde_json::from_str::<Feed>(json)
        .map_err(|e| Error::ScrapeStructure(format_compact!("message feed: {e}")))?;

    Ok(feed
        .records
        .into_iter()
        .filter_map(|record| record.message)
        .collect())
}
