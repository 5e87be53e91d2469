//! Day-type normalization.
//!
//! Grouped counts keyed by weekday mix together however many Mondays,
//! Tuesdays, ... the retained history contains. Dividing by the number of
//! distinct calendar days per weekday turns "all Mondays combined" into
//! "the average Monday", comparable across weeks.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::Weekday;

/// Number of distinct calendar dates per weekday over the full dataset.
///
/// Must be computed once over the whole retained window, never per filtered
/// subset, or denominators diverge between charts slicing the same data.
pub fn day_counts(dates: impl IntoIterator<Item = NaiveDate>) -> BTreeMap<Weekday, u64> {
    let distinct: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let mut counts = BTreeMap::new();
    for date in distinct {
        *counts.entry(Weekday::from_date(date)).or_insert(0) += 1;
    }
    counts
}

/// Divides weekday-keyed counts by the matching day count. Groups whose
/// weekday has no reference days are dropped (nothing to normalize by).
pub fn normalize_by_weekday(
    counts: &BTreeMap<Weekday, u64>,
    days: &BTreeMap<Weekday, u64>,
) -> BTreeMap<Weekday, f64> {
    counts
        .iter()
        .filter_map(|(wd, &c)| {
            let n = *days.get(wd)?;
            (n > 0).then(|| (*wd, c as f64 / n as f64))
        })
        .collect()
}

/// Same, for tables keyed by (weekday, secondary key) such as
/// weekday x hour-label heatmaps.
pub fn normalize_grouped<K: Ord + Clone>(
    counts: &BTreeMap<(Weekday, K), u64>,
    days: &BTreeMap<Weekday, u64>,
) -> BTreeMap<(Weekday, K), f64> {
    counts
        .iter()
        .filter_map(|((wd, k), &c)| {
            let n = *days.get(wd)?;
            (n > 0).then(|| ((*wd, k.clone()), c as f64 / n as f64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_day_counts_distinct_dates_only() {
        // 2025-06-16 and 2025-06-23 are Mondays; the 17th is a Tuesday.
        // Repeated dates must not inflate the reference.
        let counts = day_counts(vec![d(16), d(16), d(23), d(17)]);
        assert_eq!(counts.get(&Weekday::Lunes), Some(&2));
        assert_eq!(counts.get(&Weekday::Martes), Some(&1));
    }

    #[test]
    fn test_normalize_divides_by_day_count() {
        let mut counts = BTreeMap::new();
        counts.insert(Weekday::Lunes, 10);
        counts.insert(Weekday::Martes, 9);
        let mut days = BTreeMap::new();
        days.insert(Weekday::Lunes, 2);
        days.insert(Weekday::Martes, 3);

        let avg = normalize_by_weekday(&counts, &days);
        assert_eq!(avg.get(&Weekday::Lunes), Some(&5.0));
        assert_eq!(avg.get(&Weekday::Martes), Some(&3.0));
    }

    #[test]
    fn test_normalize_with_one_day_is_identity() {
        let mut counts = BTreeMap::new();
        counts.insert(Weekday::Viernes, 42);
        let mut days = BTreeMap::new();
        days.insert(Weekday::Viernes, 1);

        let avg = normalize_by_weekday(&counts, &days);
        assert_eq!(avg.get(&Weekday::Viernes), Some(&42.0));
    }

    #[test]
    fn test_normalize_grouped_keys() {
        let mut counts = BTreeMap::new();
        counts.insert((Weekday::Lunes, "08:00".to_string()), 8);
        counts.insert((Weekday::Lunes, "09:00".to_string()), 4);
        let mut days = BTreeMap::new();
        days.insert(Weekday::Lunes, 4);

        let avg = normalize_grouped(&counts, &days);
        assert_eq!(avg.get(&(Weekday::Lunes, "08:00".to_string())), Some(&2.0));
        assert_eq!(avg.get(&(Weekday::Lunes, "09:00".to_string())), Some(&1.0));
    }

    #[test]
    fn test_missing_weekday_reference_drops_group() {
        let mut counts = BTreeMap::new();
        counts.insert(Weekday::Domingo, 3);
        let days = BTreeMap::new();
        assert!(normalize_by_weekday(&counts, &days).is_empty());
    }
}
