//! Unique-vehicle counting over arbitrary grouping keys.
//!
//! Every "vehículos únicos" metric in the dashboard goes through
//! [`count_unique`]: the count for a group is the cardinality of its
//! `station_id` set. A raw row count is a defect, since one vehicle emits
//! many beacons per bucket.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

/// Distinct `station_id` count per grouping key. Returned in key order
/// (`BTreeMap`), which for temporal keys is chronological.
pub fn count_unique<R, K, KF, IF>(rows: &[R], key: KF, station: IF) -> BTreeMap<K, u64>
where
    K: Ord,
    KF: Fn(&R) -> K,
    IF: Fn(&R) -> i64,
{
    let mut sets: BTreeMap<K, BTreeSet<i64>> = BTreeMap::new();
    for row in rows {
        sets.entry(key(row)).or_default().insert(station(row));
    }
    sets.into_iter().map(|(k, s)| (k, s.len() as u64)).collect()
}

/// The bucket with the highest unique-vehicle count in a
/// (date, bucket-label)-keyed count table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Peak {
    pub date: NaiveDate,
    pub hour_label: String,
    pub vehicles: u64,
}

/// Peak bucket of a count table. Ties resolve to the first row in the
/// table's chronological order; `None` on empty input.
pub fn peak_bucket(counts: &BTreeMap<(NaiveDate, String), u64>) -> Option<Peak> {
    let mut best: Option<Peak> = None;
    for ((date, label), &vehicles) in counts {
        // Strictly-greater keeps the earliest bucket on ties.
        if best.as_ref().is_none_or(|b| vehicles > b.vehicles) {
            best = Some(Peak {
                date: *date,
                hour_label: label.clone(),
                vehicles,
            });
        }
    }
    best
}
