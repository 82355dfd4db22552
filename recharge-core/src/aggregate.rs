//! WaterYearAggregator groups recharge events into per-water-year
//! summaries and overall totals.

use crate::calculation::{RechargeEvent, YearlySummary};
use std::collections::BTreeMap;

/// Aggregate `events` into one [`YearlySummary`] per water-year label,
/// ordered by label (§4.8).
pub fn aggregate(events: &[RechargeEvent]) -> Vec<YearlySummary> {
    let mut groups: BTreeMap<String, Vec<&RechargeEvent>> = BTreeMap::new();
    for event in events {
        groups.entry(event.water_year.clone()).or_default().push(event);
    }

    groups
        .into_iter()
        .map(|(water_year, group)| summarize(water_year, &group))
        .collect()
}

/// Aggregate `events` into a single overall summary, ignoring water-year
/// boundaries (§4.8, "Overall totals analogously").
pub fn aggregate_overall(events: &[RechargeEvent]) -> Option<YearlySummary> {
    if events.is_empty() {
        return None;
    }
    let refs: Vec<&RechargeEvent> = events.iter().collect();
    Some(summarize("overall".to_string(), &refs))
}

fn summarize(water_year: String, group: &[&RechargeEvent]) -> YearlySummary {
    let num_events = group.len();
    let total_recharge_in: f64 = group.iter().map(|e| e.recharge_value_inches).sum();
    let max_deviation = group.iter().map(|e| e.deviation).fold(f64::MIN, f64::max);
    let avg_deviation = group.iter().map(|e| e.deviation).sum::<f64>() / num_events as f64;

    let annual_rate_in_per_yr = if num_events > 1 {
        let min_ts = group.iter().map(|e| e.event_ts).min().unwrap();
        let max_ts = group.iter().map(|e| e.event_ts).max().unwrap();
        let span_days = (max_ts - min_ts).num_seconds() as f64 / 86_400.0;
        if span_days > 0.0 {
            total_recharge_in * 365.0 / span_days
        } else {
            total_recharge_in * 365.0
        }
    } else {
        total_recharge_in * 365.0
    };

    YearlySummary {
        calculation_id: None,
        water_year,
        total_recharge_in,
        num_events,
        annual_rate_in_per_yr,
        max_deviation,
        avg_deviation,
    }
}
