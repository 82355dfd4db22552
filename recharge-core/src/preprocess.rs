//! Conditions irregular, noisy, pump-cycle-contaminated
//! sensor traces into analysis-grade series while preserving the causality
//! RISE needs (trailing-only smoothing).

use crate::config::{Configuration, DownsampleFrequency, DownsampleMethod, SmoothingWindowType};
use crate::error::PreprocessError;
use crate::series::{Reading, Series};
use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use log::{debug, warn};

/// A raw, loosely-typed input row, before column standardization.
/// Mirrors the host's tabular source, which may use aliases such as
/// `timestamp_utc` / `water_level` instead of the canonical `timestamp` / `level`.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub timestamp: Option<DateTime<Utc>>,
    pub level: Option<f64>,
}

/// Standardize a batch of raw rows into a `Series`, dropping rows whose
/// timestamp or `level` failed to coerce. These are local failures absorbed
/// by dropping the row; surfaced as `InvalidTimestamp`/`InvalidLevel` only if
/// every row in the batch was unusable.
pub fn standardize_columns(rows: Vec<RawRow>) -> Result<Series, PreprocessError> {
    let total = rows.len();
    let mut bad_timestamps = 0usize;
    let mut bad_levels = 0usize;

    let readings: Vec<Reading> = rows
        .into_iter()
        .filter_map(|row| match (row.timestamp, row.level) {
            (Some(timestamp), Some(level)) if level.is_finite() => Some(Reading { timestamp, level }),
            (None, _) => {
                bad_timestamps += 1;
                None
            }
            (Some(_), _) => {
                bad_levels += 1;
                None
            }
        })
        .collect();

    if readings.is_empty() && total > 0 {
        return if bad_timestamps >= bad_levels {
            Err(PreprocessError::InvalidTimestamp(format!(
                "{bad_timestamps} of {total} rows had an unparseable timestamp"
            )))
        } else {
            Err(PreprocessError::InvalidLevel(format!(
                "{bad_levels} of {total} rows had a non-numeric level"
            )))
        };
    }

    Ok(Series::from_readings(readings))
}

/// Run the full preprocessing pipeline over a raw series.
/// Deterministic per `(series, config)`.
pub fn run(raw: &Series, config: &Configuration) -> Result<Series, PreprocessError> {
    config
        .validate()
        .map_err(|e| PreprocessError::InvalidParameter(format!("{e:?}"), e.to_string()))?;

    let mut readings: Vec<Reading> = raw.readings().to_vec();

    // Stage 1: drop coercion failures before anything statistical runs on them.
    // A stray NaN/±Inf reaching `remove_outliers` would poison its mean/stdev and
    // silently fail every row's z-score check.
    let before = readings.len();
    readings.retain(|r| r.level.is_finite());
    if readings.len() != before {
        debug!("dropped {} non-finite rows during column standardization", before - readings.len());
    }

    // Stage 2: strict sort, then de-duplicate by timestamp keeping last.
    readings.sort_by_key(|r| r.timestamp);
    readings = dedup_keep_last(readings);
    debug!("after sort/dedup: {} rows", readings.len());

    // Stage 3: outlier removal.
    if config.remove_outliers {
        readings = remove_outliers(readings, config.outlier_threshold);
        debug!("after outlier removal: {} rows", readings.len());
    }

    // Stage 4: downsampling.
    if config.downsample_frequency != DownsampleFrequency::None {
        readings = downsample(readings, config.downsample_frequency, config.downsample_method);
        debug!("after downsampling: {} rows", readings.len());
        if readings.is_empty() {
            return Err(PreprocessError::InsufficientData);
        }
    }

    // Stage 5: smoothing.
    if config.enable_smoothing {
        if config.smoothing_window > readings.len() {
            return Err(PreprocessError::InvalidParameter(
                "smoothing_window".to_string(),
                format!(
                    "window ({}) is larger than the series length ({})",
                    config.smoothing_window,
                    readings.len()
                ),
            ));
        }
        readings = smooth(readings, config.smoothing_window, config.smoothing_window_type);
        debug!("after smoothing: {} rows", readings.len());
    }

    // Stage 6: final sanitation.
    let before = readings.len();
    readings.retain(|r| r.level.is_finite());
    if readings.len() != before {
        warn!("dropped {} non-finite rows during final sanitation", before - readings.len());
    }

    if readings.len() < 2 {
        return Err(PreprocessError::InsufficientData);
    }

    Ok(Series::from_readings(readings))
}

fn dedup_keep_last(readings: Vec<Reading>) -> Vec<Reading> {
    let mut out: Vec<Reading> = Vec::with_capacity(readings.len());
    for r in readings {
        if let Some(last) = out.last_mut() {
            if last.timestamp == r.timestamp {
                *last = r;
                continue;
            }
        }
        out.push(r);
    }
    out
}

fn remove_outliers(readings: Vec<Reading>, threshold: f64) -> Vec<Reading> {
    let n = readings.len() as f64;
    if n == 0.0 {
        return readings;
    }
    let mean: f64 = readings.iter().map(|r| r.level).sum::<f64>() / n;
    let variance: f64 = readings.iter().map(|r| (r.level - mean).powi(2)).sum::<f64>() / n;
    let stdev = variance.sqrt();
    if stdev == 0.0 {
        return readings;
    }
    readings
        .into_iter()
        .filter(|r| ((r.level - mean) / stdev).abs() < threshold)
        .collect()
}

/// The start of the period bucket containing `ts`.
fn period_start(ts: DateTime<Utc>, freq: DownsampleFrequency) -> DateTime<Utc> {
    match freq {
        DownsampleFrequency::None => ts,
        DownsampleFrequency::Hourly => ts
            .date_naive()
            .and_hms_opt(ts.hour(), 0, 0)
            .map(|n| Utc.from_utc_datetime(&n))
            .unwrap(),
        DownsampleFrequency::Daily => ts
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|n| Utc.from_utc_datetime(&n))
            .unwrap(),
        DownsampleFrequency::Weekly => {
            let days_since_monday = ts.weekday().num_days_from_monday() as i64;
            let day_start = ts
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|n| Utc.from_utc_datetime(&n))
                .unwrap();
            day_start - Duration::days(days_since_monday)
        }
        DownsampleFrequency::Monthly => Utc
            .with_ymd_and_hms(ts.year(), ts.month(), 1, 0, 0, 0)
            .unwrap(),
    }
}

fn downsample(readings: Vec<Reading>, freq: DownsampleFrequency, method: DownsampleMethod) -> Vec<Reading> {
    use std::collections::BTreeMap;

    let mut buckets: BTreeMap<DateTime<Utc>, Vec<Reading>> = BTreeMap::new();
    for r in readings {
        buckets.entry(period_start(r.timestamp, freq)).or_default().push(r);
    }

    buckets
        .into_iter()
        .map(|(period, mut group)| {
            let level = match method {
                DownsampleMethod::Mean => group.iter().map(|r| r.level).sum::<f64>() / group.len() as f64,
                DownsampleMethod::Median => {
                    group.sort_by(|a, b| a.level.total_cmp(&b.level));
                    let mid = group.len() / 2;
                    if group.len() % 2 == 0 {
                        (group[mid - 1].level + group[mid].level) / 2.0
                    } else {
                        group[mid].level
                    }
                }
                DownsampleMethod::Last => {
                    group.sort_by_key(|r| r.timestamp);
                    group.last().unwrap().level
                }
            };
            Reading {
                timestamp: period,
                level,
            }
        })
        .collect()
}

fn smooth(readings: Vec<Reading>, window: usize, window_type: SmoothingWindowType) -> Vec<Reading> {
    let levels: Vec<f64> = readings.iter().map(|r| r.level).collect();
    let n = levels.len();

    readings
        .iter()
        .enumerate()
        .map(|(i, reading)| {
            let (lo, hi) = match window_type {
                SmoothingWindowType::Trailing => (i.saturating_sub(window - 1), i),
                SmoothingWindowType::Centered => {
                    let half = window / 2;
                    (i.saturating_sub(half), (i + half).min(n - 1))
                }
            };
            let slice = &levels[lo..=hi];
            let mean = slice.iter().sum::<f64>() / slice.len() as f64;
            Reading {
                timestamp: reading.timestamp,
                level: mean,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

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
    fn sorts_and_dedups() {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let raw = Series::new(vec![
            Reading {
                timestamp: base + Duration::days(1),
                level: 10.0,
            },
            Reading {
                timestamp: base,
                level: 9.0,
            },
            Reading {
                timestamp: base,
                level: 9.5,
            },
        ]);
        let out = run(&raw, &Configuration::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.readings()[0].level, 9.5);
    }

    #[test]
    fn insufficient_data_below_two_rows() {
        let raw = series_from(&[1.0]);
        let err = run(&raw, &Configuration::default()).unwrap_err();
        assert!(matches!(err, PreprocessError::InsufficientData));
    }

    #[test]
    fn smoothing_window_larger_than_series_errors() {
        let raw = series_from(&[1.0, 2.0, 3.0]);
        let cfg = Configuration {
            enable_smoothing: true,
            smoothing_window: 10,
            ..Configuration::default()
        };
        let err = run(&raw, &cfg).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidParameter(_, _)));
    }

    #[test]
    fn trailing_smoothing_uses_only_past_samples() {
        let raw = series_from(&[1.0, 2.0, 3.0, 100.0, 5.0]);
        let cfg = Configuration {
            enable_smoothing: true,
            smoothing_window: 2,
            smoothing_window_type: SmoothingWindowType::Trailing,
            ..Configuration::default()
        };
        let out = run(&raw, &cfg).unwrap();
        // index 2 (value 3.0) must not see the future spike at index 3 (100.0)
        assert_eq!(out.readings()[2].level, 2.5);
    }

    #[test]
    fn idempotent_after_downsampling() {
        let raw = series_from(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let cfg = Configuration {
            downsample_frequency: DownsampleFrequency::Daily,
            ..Configuration::default()
        };
        let once = run(&raw, &cfg).unwrap();
        let twice = run(&once, &cfg).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn a_single_nan_does_not_poison_outlier_removal() {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let mut readings: Vec<Reading> = (0..20)
            .map(|i| Reading {
                timestamp: base + Duration::days(i),
                level: 10.0,
            })
            .collect();
        readings.push(Reading {
            timestamp: base + Duration::days(20),
            level: f64::NAN,
        });
        let raw = Series::new(readings);
        let cfg = Configuration {
            remove_outliers: true,
            ..Configuration::default()
        };
        let out = run(&raw, &cfg).unwrap();
        assert_eq!(out.len(), 20);
        assert!(out.levels().iter().all(|l| *l == 10.0));
    }

    #[test]
    fn finite_values_only() {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let raw = Series::new(vec![
            Reading {
                timestamp: base,
                level: 1.0,
            },
            Reading {
                timestamp: base + Duration::days(1),
                level: f64::NAN,
            },
            Reading {
                timestamp: base + Duration::days(2),
                level: 3.0,
            },
        ]);
        let out = run(&raw, &Configuration::default()).unwrap();
        assert!(out.levels().iter().all(|l| l.is_finite()));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn standardize_columns_drops_bad_rows_but_keeps_good_ones() {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![
            RawRow {
                timestamp: Some(base),
                level: Some(1.0),
            },
            RawRow {
                timestamp: None,
                level: Some(2.0),
            },
            RawRow {
                timestamp: Some(base + Duration::days(1)),
                level: Some(f64::NAN),
            },
        ];
        let out = standardize_columns(rows).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn standardize_columns_surfaces_invalid_timestamp_when_batch_is_empty() {
        let rows = vec![
            RawRow {
                timestamp: None,
                level: Some(1.0),
            },
            RawRow {
                timestamp: None,
                level: Some(2.0),
            },
        ];
        let err = standardize_columns(rows).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidTimestamp(_)));
    }

    #[test]
    fn standardize_columns_surfaces_invalid_level_when_batch_is_empty() {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![
            RawRow {
                timestamp: Some(base),
                level: None,
            },
            RawRow {
                timestamp: Some(base + Duration::days(1)),
                level: Some(f64::NAN),
            },
        ];
        let err = standardize_columns(rows).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidLevel(_)));
    }
}
