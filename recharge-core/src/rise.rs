//! The RISE method. Attributes each positive daily rise
//! (subject to a threshold) to a recharge event.

use crate::calculation::RechargeEvent;
use crate::config::{Configuration, SmoothingWindowType};
use crate::error::MethodError;
use crate::series::Series;
use crate::water_year::water_year_of;

/// Run RISE over a processed series (§4.6).
///
/// Requires trailing smoothing: a centered window would leak future samples
/// into today's attribution, so `config.enable_smoothing &&
/// config.smoothing_window_type == Centered` is rejected outright.
pub fn run(series: &Series, config: &Configuration) -> Result<Vec<RechargeEvent>, MethodError> {
    if config.enable_smoothing && config.smoothing_window_type == SmoothingWindowType::Centered {
        return Err(MethodError::CenteredSmoothingForbidden);
    }
    if !(0.0 < config.specific_yield && config.specific_yield <= 0.5) {
        return Err(MethodError::InvalidSpecificYield(config.specific_yield));
    }

    let readings = series.readings();
    if readings.len() < 2 {
        return Ok(Vec::new());
    }

    let mut events: Vec<RechargeEvent> = readings
        .windows(2)
        .filter_map(|w| {
            let rise = w[1].level - w[0].level;
            let is_event = rise > 0.0 && rise >= config.rise_threshold;
            if !is_event {
                return None;
            }
            Some(RechargeEvent {
                calculation_id: None,
                event_ts: w[1].timestamp,
                water_year: water_year_of(w[1].timestamp, config.water_year_month, config.water_year_day),
                level: w[1].level,
                predicted_level: w[0].level,
                deviation: rise,
                recharge_value_inches: rise * config.specific_yield * 12.0,
            })
        })
        .collect();

    events.sort_by_key(|e| e.event_ts);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Reading;
    use chrono::{Duration, TimeZone, Utc};

    fn series_from(levels: &[f64]) -> Series {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        Series::new(
            levels
                .iter()
                .enumerate()
                .map(|(i, &level)| Reading {
                    timestamp: base + Duration::days(i as i64),
                    level,
                })
                .collect(),
        )
    }

    #[test]
    fn single_rise_emits_one_event() {
        let series = series_from(&[10.0, 10.0, 10.5, 10.5]);
        let events = run(&series, &Configuration::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert!((events[0].deviation - 0.5).abs() < 1e-9);
        assert!((events[0].recharge_value_inches - 0.5 * 0.2 * 12.0).abs() < 1e-9);
    }

    #[test]
    fn rise_below_threshold_is_not_an_event() {
        let series = series_from(&[10.0, 10.05, 10.1]);
        let cfg = Configuration {
            rise_threshold: 0.2,
            ..Configuration::default()
        };
        let events = run(&series, &cfg).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn declines_never_emit_events() {
        let series = series_from(&[10.0, 9.0, 8.0]);
        let events = run(&series, &Configuration::default()).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn centered_smoothing_is_rejected() {
        let series = series_from(&[10.0, 10.5]);
        let cfg = Configuration {
            enable_smoothing: true,
            smoothing_window_type: SmoothingWindowType::Centered,
            ..Configuration::default()
        };
        let err = run(&series, &cfg).unwrap_err();
        assert!(matches!(err, MethodError::CenteredSmoothingForbidden));
    }

    #[test]
    fn empty_series_is_not_an_error() {
        let series = series_from(&[]);
        let events = run(&series, &Configuration::default()).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn invalid_specific_yield_is_rejected() {
        let series = series_from(&[10.0, 10.5]);
        let cfg = Configuration {
            specific_yield: 0.9,
            ..Configuration::default()
        };
        // validate() would normally catch this upstream; rise::run enforces it too.
        let err = run(&series, &cfg).unwrap_err();
        assert!(matches!(err, MethodError::InvalidSpecificYield(_)));
    }
}
