//! Non-linear least squares fitting over drawdown curves.

use crate::curve::{Curve, CurveType};
use crate::error::FitError;
use crate::recession::RecessionSegment;
use chrono::Utc;
use log::{debug, info, warn};
use rayon::prelude::*;

/// Levenberg-Marquardt tuning, mirrors the defaults a finite-difference LM
/// solver typically ships with.
#[derive(Debug, Clone, Copy)]
pub struct FitterConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub initial_lambda: f64,
    pub lambda_factor: f64,
    pub min_lambda: f64,
    pub max_lambda: f64,
    pub jacobian_step: f64,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-10,
            initial_lambda: 1e-3,
            lambda_factor: 10.0,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            jacobian_step: 1e-6,
        }
    }
}

/// The initial guesses required by §4.5's automatic fitting contract.
pub const DEFAULT_INITIAL_GUESSES: [(f64, f64); 4] = [(1.0, 0.1), (10.0, 0.01), (0.1, 1.0), (5.0, 0.05)];

struct Observation {
    t: f64,
    d: f64,
}

/// Flatten the selected segments into `(t, d)` observation pairs, resetting
/// `t = 0` at each segment's first sample (§4.5 data construction).
fn build_observations(segments: &[RecessionSegment]) -> Vec<Observation> {
    let mut observations = Vec::new();
    for segment in segments {
        let start_level = segment.start_level;
        if let Some(first) = segment.data.first() {
            let t0 = first.timestamp;
            for reading in segment.data.readings() {
                let t = (reading.timestamp - t0).num_seconds() as f64 / 86_400.0;
                let d = start_level - reading.level;
                observations.push(Observation { t, d });
            }
        }
    }
    observations
}

fn residual(curve_type: CurveType, params: (f64, f64), obs: &Observation) -> f64 {
    obs.d - crate::curve::predict(curve_type, params, obs.t)
}

/// One Levenberg-Marquardt run from a single initial guess. Returns the
/// converged `(a, b)` or `None` if iterations were exhausted without meeting
/// `tolerance`.
fn lm_fit(
    curve_type: CurveType,
    observations: &[Observation],
    initial: (f64, f64),
    config: &FitterConfig,
) -> Option<(f64, f64)> {
    let mut params = initial;
    let mut lambda = config.initial_lambda;
    let n = observations.len();
    if n == 0 {
        return None;
    }

    let cost = |p: (f64, f64)| -> f64 {
        observations.iter().map(|o| residual(curve_type, p, o).powi(2)).sum()
    };

    let mut current_cost = cost(params);

    for _ in 0..config.max_iterations {
        // Finite-difference Jacobian of the residual vector w.r.t. (a, b).
        let h = config.jacobian_step;
        let mut jtj = [[0.0_f64; 2]; 2];
        let mut jtr = [0.0_f64; 2];

        for o in observations {
            let r = residual(curve_type, params, o);
            let r_da = (residual(curve_type, (params.0 + h, params.1), o) - r) / h;
            let r_db = (residual(curve_type, (params.0, params.1 + h), o) - r) / h;
            let j = [r_da, r_db];

            for row in 0..2 {
                jtr[row] += j[row] * r;
                for col in 0..2 {
                    jtj[row][col] += j[row] * j[col];
                }
            }
        }

        let mut improved = false;
        for _ in 0..30 {
            let mut a = jtj;
            a[0][0] += lambda * a[0][0].max(1e-12);
            a[1][1] += lambda * a[1][1].max(1e-12);

            let det = a[0][0] * a[1][1] - a[0][1] * a[1][0];
            if det.abs() < 1e-300 {
                lambda *= config.lambda_factor;
                continue;
            }
            let delta_a = (a[1][1] * jtr[0] - a[0][1] * jtr[1]) / det;
            let delta_b = (a[0][0] * jtr[1] - a[1][0] * jtr[0]) / det;

            let candidate = (params.0 - delta_a, params.1 - delta_b);
            if !candidate.0.is_finite() || !candidate.1.is_finite() {
                lambda *= config.lambda_factor;
                continue;
            }

            let candidate_cost = cost(candidate);
            if candidate_cost < current_cost {
                let improvement = current_cost - candidate_cost;
                params = candidate;
                current_cost = candidate_cost;
                lambda = (lambda / config.lambda_factor).max(config.min_lambda);
                improved = true;
                if improvement < config.tolerance {
                    return Some(params);
                }
                break;
            } else {
                lambda = (lambda * config.lambda_factor).min(config.max_lambda);
            }
        }

        if !improved && lambda >= config.max_lambda {
            break;
        }
    }

    if params.0.is_finite() && params.1.is_finite() {
        Some(params)
    } else {
        None
    }
}

fn metrics(curve_type: CurveType, observations: &[Observation], params: (f64, f64)) -> (f64, f64) {
    let n = observations.len() as f64;
    let mean_d = observations.iter().map(|o| o.d).sum::<f64>() / n;
    let ss_res: f64 = observations
        .iter()
        .map(|o| (o.d - crate::curve::predict(curve_type, params, o.t)).powi(2))
        .sum();
    let ss_tot: f64 = observations.iter().map(|o| (o.d - mean_d).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };
    let rmse = (ss_res / n).sqrt();
    (r_squared.max(0.0), rmse)
}

/// Automatic fit: runs all `DEFAULT_INITIAL_GUESSES` in parallel, keeping the
/// converged result with the highest R² (§4.5).
pub fn fit_automatic(
    well_id: &str,
    mut segments: Vec<RecessionSegment>,
    curve_type: CurveType,
    config: &FitterConfig,
) -> Result<Curve, FitError> {
    if segments.is_empty() {
        return Err(FitError::NoSegments);
    }
    segments.retain(|s| s.selected);
    if segments.is_empty() {
        return Err(FitError::NoSegments);
    }

    let observations = build_observations(&segments);

    let candidates: Vec<(f64, f64, f64)> = DEFAULT_INITIAL_GUESSES
        .into_par_iter()
        .filter_map(|guess| {
            let fitted = lm_fit(curve_type, &observations, guess, config)?;
            let (r_squared, _rmse) = metrics(curve_type, &observations, fitted);
            debug!("guess {guess:?} converged to {fitted:?} with r2={r_squared}");
            Some((fitted.0, fitted.1, r_squared))
        })
        .collect();

    let best = candidates
        .into_iter()
        .max_by(|a, b| a.2.total_cmp(&b.2));

    let (a, b, r_squared) = match best {
        Some(best) => best,
        None => {
            warn!("no initial guess converged for {curve_type:?} on well {well_id}");
            return Err(FitError::DidNotConverge(curve_type));
        }
    };

    let (_, rmse) = metrics(curve_type, &observations, (a, b));
    info!("fit {curve_type:?} for well {well_id}: a={a}, b={b}, r2={r_squared}, rmse={rmse}");

    Ok(curve_from_fit(well_id, segments, curve_type, (a, b), r_squared, rmse, false))
}

/// Manual fit: the caller supplies `(a, b)` directly; this path only computes the
/// goodness-of-fit metrics (§4.5).
pub fn fit_manual(
    well_id: &str,
    segments: Vec<RecessionSegment>,
    curve_type: CurveType,
    params: (f64, f64),
) -> Result<Curve, FitError> {
    if segments.is_empty() {
        return Err(FitError::NoSegments);
    }
    if !params.0.is_finite() || !params.1.is_finite() {
        return Err(FitError::InvalidParameters(format!("{params:?} is not finite")));
    }
    let observations = build_observations(&segments);
    let (r_squared, rmse) = metrics(curve_type, &observations, params);
    Ok(curve_from_fit(well_id, segments, curve_type, params, r_squared, rmse, true))
}

fn curve_from_fit(
    well_id: &str,
    segments: Vec<RecessionSegment>,
    curve_type: CurveType,
    params: (f64, f64),
    r_squared: f64,
    rmse: f64,
    is_manual: bool,
) -> Curve {
    let data_start_ts = segments.iter().map(|s| s.start_ts).min().unwrap();
    let data_end_ts = segments.iter().map(|s| s.end_ts).max().unwrap();
    Curve {
        id: None,
        well_id: well_id.to_string(),
        curve_type,
        params,
        r_squared,
        rmse,
        recession_segments_count: segments.len(),
        data_start_ts,
        data_end_ts,
        description: String::new(),
        version: 1,
        parent_curve_id: None,
        is_active: true,
        created_ts: Utc::now(),
        is_manual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Reading, Series};
    use chrono::{Duration, TimeZone, Utc as ChronoUtc};

    fn segment_from_curve(curve_type: CurveType, params: (f64, f64), n: usize) -> RecessionSegment {
        let base = ChronoUtc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let start_level = 100.0;
        let readings: Vec<Reading> = (0..n)
            .map(|i| Reading {
                timestamp: base + Duration::days(i as i64),
                level: start_level - crate::curve::predict(curve_type, params, i as f64),
            })
            .collect();
        let data = Series::new(readings.clone());
        RecessionSegment {
            id: None,
            curve_id: None,
            start_ts: readings.first().unwrap().timestamp,
            end_ts: readings.last().unwrap().timestamp,
            duration_days: n as i64 - 1,
            start_level,
            end_level: readings.last().unwrap().level,
            recession_rate: -0.1,
            data,
            quality: 1.0,
            selected: true,
        }
    }

    #[test]
    fn recovers_known_exponential_parameters() {
        let segment = segment_from_curve(CurveType::Exponential, (5.0, 0.2), 40);
        let curve = fit_automatic("well-1", vec![segment], CurveType::Exponential, &FitterConfig::default())
            .unwrap();
        assert!(curve.r_squared > 0.99, "r2 = {}", curve.r_squared);
        assert!((curve.params.0 - 5.0).abs() < 0.1);
        assert!((curve.params.1 - 0.2).abs() < 0.02);
    }

    #[test]
    fn empty_segments_fail_fast() {
        let err = fit_automatic("well-1", vec![], CurveType::Exponential, &FitterConfig::default()).unwrap_err();
        assert!(matches!(err, FitError::NoSegments));
    }

    #[test]
    fn manual_fit_skips_optimization() {
        let segment = segment_from_curve(CurveType::Linear, (10.0, 0.3), 20);
        let curve = fit_manual("well-1", vec![segment], CurveType::Linear, (10.0, 0.3)).unwrap();
        assert!(curve.is_manual);
        assert!(curve.r_squared > 0.99);
    }

    #[test]
    fn manual_fit_rejects_non_finite_params() {
        let segment = segment_from_curve(CurveType::Linear, (10.0, 0.3), 20);
        let err = fit_manual("well-1", vec![segment], CurveType::Linear, (f64::NAN, 0.3)).unwrap_err();
        assert!(matches!(err, FitError::InvalidParameters(_)));
    }
}
