//! The MRC method. Reconstructs a predicted (no-recharge)
//! trajectory from a fitted Curve and flags deviations as recharge events.

use crate::calculation::RechargeEvent;
use crate::config::Configuration;
use crate::curve::Curve;
use crate::error::MethodError;
use crate::series::Series;
use crate::water_year::water_year_of;

/// Run MRC over a processed series against a fitted `curve` (§4.7).
pub fn run(series: &Series, curve: &Curve, config: &Configuration) -> Result<Vec<RechargeEvent>, MethodError> {
    if !curve.params.0.is_finite() || !curve.params.1.is_finite() {
        return Err(MethodError::InvalidCurve);
    }
    if config.mrc_deviation_threshold <= 0.0 {
        return Err(MethodError::InvalidDeviationThreshold(config.mrc_deviation_threshold));
    }
    if !(0.0 < config.specific_yield && config.specific_yield <= 0.5) {
        return Err(MethodError::InvalidSpecificYield(config.specific_yield));
    }

    let readings = series.readings();
    let mut predicted: Vec<f64> = readings.iter().map(|r| r.level).collect();

    // Maximal in-recession groups: Δ < 0 between consecutive samples.
    let mut i = 1usize;
    while i < readings.len() {
        if readings[i].level - readings[i - 1].level < 0.0 {
            let group_start = i - 1;
            let mut group_end = i;
            while group_end + 1 < readings.len() && readings[group_end + 1].level - readings[group_end].level < 0.0 {
                group_end += 1;
            }
            if group_end - group_start + 1 >= 2 {
                let t0 = readings[group_start].timestamp;
                let l0 = readings[group_start].level;
                for idx in group_start..=group_end {
                    let t_days = (readings[idx].timestamp - t0).num_seconds() as f64 / 86_400.0;
                    let d_hat = curve.predict(t_days);
                    predicted[idx] = l0 - d_hat;
                }
            }
            i = group_end + 1;
        } else {
            i += 1;
        }
    }

    let mut events: Vec<RechargeEvent> = readings
        .iter()
        .zip(predicted.iter())
        .filter_map(|(reading, &predicted_level)| {
            let deviation = reading.level - predicted_level;
            if deviation <= config.mrc_deviation_threshold {
                return None;
            }
            Some(RechargeEvent {
                calculation_id: None,
                event_ts: reading.timestamp,
                water_year: water_year_of(reading.timestamp, config.water_year_month, config.water_year_day),
                level: reading.level,
                predicted_level,
                deviation,
                recharge_value_inches: deviation * config.specific_yield * 12.0,
            })
        })
        .collect();

    events.sort_by_key(|e| e.event_ts);
    Ok(events)
}
