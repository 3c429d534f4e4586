use chrono::{NaiveDateTime, Timelike};

/// The format WebClass prints availability windows in.
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

pub fn parse_time(time_str: &str) -> Option<NaiveDateTime> {
    let time = NaiveDateTime::parse_from_str(time_str, TIME_FORMAT);
    if let Err(e) = &time {
        tracing::debug!(target: "time-converter", "{time_str:?} -> {e}");
    }
    time.ok()
}

/// Drops seconds and below, so comparisons happen at the page's resolution.
pub fn truncate_to_minute(time: NaiveDateTime) -> NaiveDateTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}
