//! Segments a processed series into maximal
//! recession-compatible runs.

use crate::error::RecessionError;
use crate::series::Series;
use chrono::{DateTime, Utc};

/// A contiguous declining run of the processed series (§3). Quality is filled
/// in by [`crate::quality::score`]; `selected` starts `true` and is the one
/// field a caller is expected to mutate before fitting.
#[derive(Debug, Clone)]
pub struct RecessionSegment {
    pub id: Option<i64>,
    pub curve_id: Option<i64>,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub duration_days: i64,
    pub start_level: f64,
    pub end_level: f64,
    pub recession_rate: f64,
    pub data: Series,
    pub quality: f64,
    pub selected: bool,
}

/// Identify recession segments in `series`.
///
/// A sample is recession-compatible when its delta from the previous sample
/// is `<= fluctuation_tolerance`. Maximal runs of compatible samples are kept
/// when they span at least `min_recession_length` days and show a strict net
/// decline.
pub fn detect(
    series: &Series,
    min_recession_length: i64,
    fluctuation_tolerance: f64,
) -> Result<Vec<RecessionSegment>, RecessionError> {
    if min_recession_length < 2 {
        return Err(RecessionError::InvalidMinLength(min_recession_length));
    }
    if fluctuation_tolerance < 0.0 {
        return Err(RecessionError::InvalidTolerance(fluctuation_tolerance));
    }

    let readings = series.readings();
    if readings.len() < 2 {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    let mut run_start = 0usize;
    let mut i = 1usize;

    while i <= readings.len() {
        let delta_compatible =
            i < readings.len() && readings[i].level - readings[i - 1].level <= fluctuation_tolerance;

        if !delta_compatible {
            if let Some(segment) = build_segment(series, run_start, i - 1, min_recession_length) {
                segments.push(segment);
            }
            run_start = i;
        }
        i += 1;
    }

    Ok(segments)
}

fn build_segment(
    series: &Series,
    start_idx: usize,
    end_idx: usize,
    min_recession_length: i64,
) -> Option<RecessionSegment> {
    if end_idx <= start_idx {
        return None;
    }
    let readings = series.readings();
    let start = readings[start_idx];
    let end = readings[end_idx];
    let duration_days = (end.timestamp - start.timestamp).num_seconds() / 86_400;

    if duration_days < min_recession_length || end.level >= start.level {
        return None;
    }

    let recession_rate = (end.level - start.level) / duration_days as f64;
    let data = series.slice_inclusive(start.timestamp, end.timestamp);

    Some(RecessionSegment {
        id: None,
        curve_id: None,
        start_ts: start.timestamp,
        end_ts: end.timestamp,
        duration_days,
        start_level: start.level,
        end_level: end.level,
        recession_rate,
        data,
        quality: 0.0,
        selected: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Reading;
    use chrono::{Duration, TimeZone};

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
    fn finds_a_single_declining_run() {
        let series = series_from(&[10.0, 9.5, 9.0, 8.5, 8.0, 7.5, 7.0, 6.5, 6.0, 5.5, 5.0]);
        let segments = detect(&series, 5, 0.0).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration_days, 10);
        assert!(segments[0].recession_rate < 0.0);
    }

    #[test]
    fn rejects_runs_below_min_length() {
        let series = series_from(&[10.0, 9.5, 9.0]);
        let segments = detect(&series, 5, 0.0).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn absorbs_small_rises_within_tolerance() {
        let series = series_from(&[10.0, 9.9, 10.0, 9.8, 9.6, 9.4, 9.2, 9.0]);
        let segments = detect(&series, 5, 0.15).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration_days, 7);
    }

    #[test]
    fn rejects_flat_or_rising_runs() {
        let series = series_from(&[5.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
        let segments = detect(&series, 2, 0.0).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let series = series_from(&[5.0, 4.0, 3.0]);
        assert!(detect(&series, 1, 0.0).is_err());
        assert!(detect(&series, 5, -1.0).is_err());
    }
}
