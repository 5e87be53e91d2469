//! Temporal binning: sub-hour time buckets and hour-of-day labels.
//!
//! Buckets strip the date component when formatted, so observations from
//! different calendar days collapse onto the same "HH:MM" label. That is the
//! intended behavior for the time-of-day profiles: they show a same-hour
//! distribution across the whole retained window, not a timeline.

use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// Floors a timestamp to the start of its `bucket_minutes`-wide bucket.
///
/// Any width that divides a day evenly is valid; the dashboard exposes
/// 30, 60, 240 and 480 minutes.
pub fn floor_to_bucket(ts: NaiveDateTime, bucket_minutes: u32) -> NaiveDateTime {
    let bucket_secs = bucket_minutes * 60;
    let secs = ts.time().num_seconds_from_midnight();
    let floored = secs - secs % bucket_secs;
    ts.date()
        .and_time(NaiveTime::from_num_seconds_from_midnight_opt(floored, 0).unwrap_or_default())
}

/// "HH:MM" label of a bucket start. Zero-padded, so lexicographic order is
/// chronological order within a day.
pub fn bucket_label(bucket_start: NaiveDateTime) -> String {
    bucket_start.format("%H:%M").to_string()
}

/// "HH:00" label for a plain hour-of-day value.
pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// Convenience: floor and format in one step.
pub fn label_for(ts: NaiveDateTime, bucket_minutes: u32) -> String {
    bucket_label(floor_to_bucket(ts, bucket_minutes))
}

/// All bucket labels of one day in chronological order, for zero-filling
/// chart axes.
pub fn day_labels(bucket_minutes: u32) -> Vec<String> {
    let n = (24 * 60) / bucket_minutes;
    (0..n)
        .map(|i| {
            let m = i * bucket_minutes;
            format!("{:02}:{:02}", m / 60, m % 60)
        })
        .collect()
}
