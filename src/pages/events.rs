//! Events page dataset: DENM cause/subcause distributions and the
//! time-of-day histogram.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::HazardEvent;
use crate::temporal;

const UNKNOWN_CAUSE: &str = "Desconocida";

/// One bar of a cause or subcause distribution. Frequencies are message
/// counts: every DENM is one reported incident.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CauseCount {
    pub label: String,
    pub frecuencia: u64,
}

/// Events per hour of day, all dates collapsed. Always 24 rows, hours with
/// no events zero-filled so the histogram axis never has holes.
#[derive(Clone, Debug, Serialize)]
pub struct HourlyEvents {
    pub hour_label: String,
    pub eventos: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct EventsPage {
    pub total_events: u64,
    pub causes: Vec<CauseCount>,
    pub subcauses: Vec<CauseCount>,
    pub hourly: Vec<HourlyEvents>,
}

fn distribution<'a>(labels: impl Iterator<Item = Option<&'a str>>) -> Vec<CauseCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for label in labels {
        *counts
            .entry(label.unwrap_or(UNKNOWN_CAUSE).to_string())
            .or_insert(0) += 1;
    }
    let mut bars: Vec<CauseCount> = counts
        .into_iter()
        .map(|(label, frecuencia)| CauseCount { label, frecuencia })
        .collect();
    // Most frequent first; the BTreeMap pass above already fixed the
    // alphabetical order within equal frequencies.
    bars.sort_by(|a, b| b.frecuencia.cmp(&a.frecuencia));
    bars
}

pub fn cause_distribution(hazards: &[HazardEvent]) -> Vec<CauseCount> {
    distribution(hazards.iter().map(|h| h.cause_desc.as_deref()))
}

/// Subcause distribution restricted to one cause, or over all events when
/// no cause is selected.
pub fn subcause_distribution(hazards: &[HazardEvent], cause: Option<&str>) -> Vec<CauseCount> {
    distribution(
        hazards
            .iter()
            .filter(|h| cause.is_none() || h.cause_desc.as_deref() == cause)
            .map(|h| h.subcause_desc.as_deref()),
    )
}

pub fn events_by_hour(hazards: &[HazardEvent], cause: Option<&str>) -> Vec<HourlyEvents> {
    let mut per_hour = [0u64; 24];
    for h in hazards
        .iter()
        .filter(|h| cause.is_none() || h.cause_desc.as_deref() == cause)
    {
        per_hour[h.hour as usize % 24] += 1;
    }
    per_hour
        .iter()
        .enumerate()
        .map(|(hour, &eventos)| HourlyEvents {
            hour_label: temporal::hour_label(hour as u32),
            eventos,
        })
        .collect()
}

pub fn build(hazards: &[HazardEvent], selected_cause: Option<&str>) -> EventsPage {
    EventsPage {
        total_events: hazards.len() as u64,
        causes: cause_distribution(hazards),
        subcauses: subcause_distribution(hazards, selected_cause),
        hourly: events_by_hour(hazards, selected_cause),
    }
}
