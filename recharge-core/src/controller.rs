//! AnalysisController orchestrates preprocessing, curve fitting, and the recharge methods against a well, honoring
//! configuration and persisting through the Repository (§4.10, §5).

use crate::aggregate;
use crate::calculation::{Calculation, Method, MethodParams};
use crate::config::Configuration;
use crate::curve::{Curve, CurveType};
use crate::error::{Cancelled, RechargeError, RepositoryError};
use crate::fit::{self, FitterConfig};
use crate::host::DataSource;
use crate::preprocess;
use crate::quality;
use crate::recession::{self, RecessionSegment};
use crate::repository::Repository;
use crate::rise;
use crate::mrc;
use chrono::Utc;
use log::info;

/// Checked between pipeline stages (§5). The default `|| false` never cancels.
pub type CancellationCheck<'a> = &'a dyn Fn() -> bool;

fn check_cancelled(is_cancelled: CancellationCheck) -> Result<(), RechargeError> {
    if is_cancelled() {
        Err(RechargeError::Cancelled(Cancelled))
    } else {
        Ok(())
    }
}

fn fetch<D: DataSource>(data_source: &D, well_id: &str) -> Result<crate::series::Series, RechargeError> {
    data_source
        .fetch_readings(well_id, None)
        .map_err(|e| RechargeError::DataSource(Box::new(e)))
}

pub struct AnalysisController<'a, D: DataSource> {
    data_source: &'a D,
    repository: &'a Repository,
}

impl<'a, D: DataSource> AnalysisController<'a, D> {
    pub fn new(data_source: &'a D, repository: &'a Repository) -> Self {
        Self { data_source, repository }
    }

    /// `run_rise`: load raw -> preprocess -> RISE -> aggregate -> persist (§4.10).
    pub fn run_rise(
        &self,
        well_id: &str,
        config: &Configuration,
        is_cancelled: CancellationCheck,
    ) -> Result<Calculation, RechargeError> {
        let raw = fetch(self.data_source, well_id)?;
        let processed = preprocess::run(&raw, config)?;
        check_cancelled(is_cancelled)?;

        let events = rise::run(&processed, config)?;
        let summaries = aggregate::aggregate(&events);
        let overall = aggregate::aggregate_overall(&events);

        let calculation = Calculation {
            id: None,
            curve_id: None,
            well_id: well_id.to_string(),
            method: Method::Rise,
            params: MethodParams::Rise {
                rise_threshold: config.rise_threshold,
                specific_yield: config.specific_yield,
                config: *config,
            },
            total_recharge_in: overall.as_ref().map(|s| s.total_recharge_in).unwrap_or(0.0),
            annual_rate_in_per_yr: overall.as_ref().map(|s| s.annual_rate_in_per_yr).unwrap_or(0.0),
            data_start_ts: processed.first().map(|r| r.timestamp).unwrap_or_else(Utc::now),
            data_end_ts: processed.last().map(|r| r.timestamp).unwrap_or_else(Utc::now),
            created_ts: Utc::now(),
        };

        check_cancelled(is_cancelled)?;
        let calc_id = self.repository.save_calculation(&calculation, &events, &summaries)?;
        info!("run_rise: well {well_id} produced calculation {calc_id} with {} events", events.len());
        Ok(Calculation { id: Some(calc_id), ..calculation })
    }

    /// `run_mrc`: load raw -> preprocess -> repository.get_curve_details -> MRC -> aggregate -> persist (§4.10).
    pub fn run_mrc(
        &self,
        well_id: &str,
        curve_id: i64,
        config: &Configuration,
        is_cancelled: CancellationCheck,
    ) -> Result<Calculation, RechargeError> {
        let (curve, _segments) = self.repository.get_curve_details(curve_id)?;
        if curve.well_id != well_id {
            return Err(RechargeError::Repository(RepositoryError::CurveWellMismatch(
                curve_id,
                well_id.to_string(),
            )));
        }

        let raw = fetch(self.data_source, well_id)?;
        let processed = preprocess::run(&raw, config)?;
        check_cancelled(is_cancelled)?;

        let events = mrc::run(&processed, &curve, config)?;
        let summaries = aggregate::aggregate(&events);
        let overall = aggregate::aggregate_overall(&events);

        let calculation = Calculation {
            id: None,
            curve_id: Some(curve_id),
            well_id: well_id.to_string(),
            method: Method::Mrc,
            params: MethodParams::Mrc {
                curve_id,
                deviation_threshold: config.mrc_deviation_threshold,
                specific_yield: config.specific_yield,
                config: *config,
            },
            total_recharge_in: overall.as_ref().map(|s| s.total_recharge_in).unwrap_or(0.0),
            annual_rate_in_per_yr: overall.as_ref().map(|s| s.annual_rate_in_per_yr).unwrap_or(0.0),
            data_start_ts: processed.first().map(|r| r.timestamp).unwrap_or_else(Utc::now),
            data_end_ts: processed.last().map(|r| r.timestamp).unwrap_or_else(Utc::now),
            created_ts: Utc::now(),
        };

        check_cancelled(is_cancelled)?;
        let calc_id = self.repository.save_calculation(&calculation, &events, &summaries)?;
        info!("run_mrc: well {well_id} produced calculation {calc_id} with {} events", events.len());
        Ok(Calculation { id: Some(calc_id), ..calculation })
    }

    /// `fit_curve`: assemble segments -> fit -> persist (§4.10).
    pub fn fit_curve(
        &self,
        well_id: &str,
        segments: Vec<RecessionSegment>,
        curve_type: CurveType,
        manual_params: Option<(f64, f64)>,
    ) -> Result<Curve, RechargeError> {
        let curve = match manual_params {
            Some(params) => fit::fit_manual(well_id, segments.clone(), curve_type, params)?,
            None => fit::fit_automatic(well_id, segments.clone(), curve_type, &FitterConfig::default())?,
        };
        let curve_id = self.repository.save_curve(&curve, &segments)?;
        Ok(Curve { id: Some(curve_id), ..curve })
    }

    /// `identify_segments`: load raw -> preprocess -> detect recessions -> score quality, transient until
    /// persisted alongside a curve via `fit_curve` (§4.10).
    pub fn identify_segments(
        &self,
        well_id: &str,
        config: &Configuration,
    ) -> Result<Vec<RecessionSegment>, RechargeError> {
        let raw = fetch(self.data_source, well_id)?;
        let processed = preprocess::run(&raw, config)?;
        let mut segments = recession::detect(&processed, config.min_recession_length, config.fluctuation_tolerance)?;
        for segment in &mut segments {
            segment.quality = quality::score(segment);
        }
        Ok(segments)
    }
}
