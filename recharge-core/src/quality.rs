//! Assigns a 0-1 quality score to a recession segment.

use crate::recession::RecessionSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityBand {
    High,
    Medium,
    Low,
}

pub fn band(quality: f64) -> QualityBand {
    if quality >= 0.8 {
        QualityBand::High
    } else if quality >= 0.6 {
        QualityBand::Medium
    } else {
        QualityBand::Low
    }
}

/// Score a segment's quality from duration, day-to-day consistency, and rate
/// magnitude (§4.4). Does not mutate `segment`; the caller assigns the result.
pub fn score(segment: &RecessionSegment) -> f64 {
    let duration_score = (segment.duration_days as f64 / 30.0).min(1.0);

    let deltas: Vec<f64> = segment
        .data
        .readings()
        .windows(2)
        .map(|w| (w[1].level - w[0].level).abs())
        .collect();
    let consistency_score = if deltas.is_empty() {
        0.5
    } else {
        let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
        if mean > 0.0 {
            let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / deltas.len() as f64;
            let std = variance.sqrt();
            1.0 - (std / mean).min(1.0)
        } else {
            0.5
        }
    };

    let rate = segment.recession_rate.abs();
    let rate_score = if (0.001..=0.1).contains(&rate) {
        1.0
    } else if rate < 0.001 {
        (rate / 0.001).max(0.1)
    } else {
        (0.1 / rate).max(0.1)
    };

    0.4 * duration_score + 0.4 * consistency_score + 0.2 * rate_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Reading, Series};
    use chrono::{Duration, TimeZone, Utc};

    fn segment_with(levels: &[f64], duration_days: i64, recession_rate: f64) -> RecessionSegment {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let data = Series::new(
            levels
                .iter()
                .enumerate()
                .map(|(i, &level)| Reading {
                    timestamp: base + Duration::days(i as i64),
                    level,
                })
                .collect(),
        );
        RecessionSegment {
            id: None,
            curve_id: None,
            start_ts: base,
            end_ts: base + Duration::days(duration_days),
            duration_days,
            start_level: levels[0],
            end_level: *levels.last().unwrap(),
            recession_rate,
            data,
            quality: 0.0,
            selected: true,
        }
    }

    #[test]
    fn perfectly_steady_long_recession_scores_high() {
        let levels: Vec<f64> = (0..=40).map(|i| 10.0 - i as f64 * 0.05).collect();
        let seg = segment_with(&levels, 40, -0.05);
        let q = score(&seg);
        assert!(q > 0.9, "expected high quality, got {q}");
        assert_eq!(band(q), QualityBand::High);
    }

    #[test]
    fn short_erratic_segment_scores_low() {
        let seg = segment_with(&[10.0, 9.0, 9.5, 5.0], 3, -1.67);
        let q = score(&seg);
        assert!(q < 0.6, "expected low-ish quality, got {q}");
    }

    #[test]
    fn rate_score_penalizes_extreme_rates() {
        let fast = segment_with(&(0..=20).map(|i| 20.0 - i as f64).collect::<Vec<_>>(), 20, -1.0);
        let moderate = segment_with(&(0..=20).map(|i| 10.0 - i as f64 * 0.05).collect::<Vec<_>>(), 20, -0.05);
        assert!(score(&moderate) > score(&fast));
    }
}
