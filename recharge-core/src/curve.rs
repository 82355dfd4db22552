//! Drawdown curve types and the persisted Curve entity (§3, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The functional family fitted to a recession's drawdown trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    Exponential,
    Power,
    Linear,
}

/// Evaluate the drawdown `d(t)` for a fitted curve type at elapsed time `t` (days).
///
/// `params` are `(a, b)` per §4.5's equation table. Power clamps `t` to `0.001`
/// to keep `t^b` and its derivative well-defined near the segment origin.
pub fn predict(curve_type: CurveType, params: (f64, f64), t: f64) -> f64 {
    let (a, b) = params;
    match curve_type {
        CurveType::Exponential => a * (1.0 - (-b * t).exp()),
        CurveType::Power => a * t.max(0.001).powf(b),
        CurveType::Linear => a + b * t,
    }
}

/// Human-readable equation string for reporting/UI use.
impl CurveType {
    pub fn as_str(self) -> &'static str {
        match self {
            CurveType::Exponential => "exponential",
            CurveType::Power => "power",
            CurveType::Linear => "linear",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exponential" => Some(CurveType::Exponential),
            "power" => Some(CurveType::Power),
            "linear" => Some(CurveType::Linear),
            _ => None,
        }
    }
}

pub fn equation_string(curve_type: CurveType, params: (f64, f64)) -> String {
    let (a, b) = params;
    match curve_type {
        CurveType::Exponential => format!("d = {a:.4} * (1 - e^(-{b:.4} * t))"),
        CurveType::Power => format!("d = {a:.4} * t^{b:.4}"),
        CurveType::Linear => format!("Q = {a:.4} - {b:.4} * t"),
    }
}

/// Qualitative fit banding, for UI/reporting only (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

pub fn fit_quality(r_squared: f64) -> FitQuality {
    if r_squared >= 0.95 {
        FitQuality::Excellent
    } else if r_squared >= 0.90 {
        FitQuality::Good
    } else if r_squared >= 0.80 {
        FitQuality::Fair
    } else {
        FitQuality::Poor
    }
}

/// A fitted drawdown curve (§3). Owns the set of recession segments used to
/// fit it; version lineage is tracked via `parent_curve_id`.
#[derive(Debug, Clone)]
pub struct Curve {
    pub id: Option<i64>,
    pub well_id: String,
    pub curve_type: CurveType,
    pub params: (f64, f64),
    pub r_squared: f64,
    pub rmse: f64,
    pub recession_segments_count: usize,
    pub data_start_ts: DateTime<Utc>,
    pub data_end_ts: DateTime<Utc>,
    pub description: String,
    pub version: i64,
    pub parent_curve_id: Option<i64>,
    pub is_active: bool,
    pub created_ts: DateTime<Utc>,
    pub is_manual: bool,
}

impl Curve {
    pub fn equation(&self) -> String {
        equation_string(self.curve_type, self.params)
    }

    pub fn quality(&self) -> FitQuality {
        fit_quality(self.r_squared)
    }

    pub fn predict(&self, t: f64) -> f64 {
        predict(self.curve_type, self.params, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_starts_at_zero_and_saturates_toward_a() {
        assert_eq!(predict(CurveType::Exponential, (5.0, 0.5), 0.0), 0.0);
        let d = predict(CurveType::Exponential, (5.0, 0.5), 1000.0);
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn power_clamps_t_near_origin() {
        let at_zero = predict(CurveType::Power, (2.0, 0.5), 0.0);
        let at_clamp = predict(CurveType::Power, (2.0, 0.5), 0.001);
        assert_eq!(at_zero, at_clamp);
    }

    #[test]
    fn linear_is_affine() {
        assert_eq!(predict(CurveType::Linear, (1.0, 2.0), 3.0), 7.0);
    }

    #[test]
    fn quality_bands() {
        assert_eq!(fit_quality(0.97), FitQuality::Excellent);
        assert_eq!(fit_quality(0.91), FitQuality::Good);
        assert_eq!(fit_quality(0.85), FitQuality::Fair);
        assert_eq!(fit_quality(0.5), FitQuality::Poor);
    }
}
