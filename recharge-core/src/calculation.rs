//! Calculation / RechargeEvent / YearlySummary entities (§3), produced by
//! the RISE and MRC methods and aggregated per water year.

use crate::config::Configuration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which water-table-fluctuation method produced a [`Calculation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Rise,
    Mrc,
    Emr,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Rise => "rise",
            Method::Mrc => "mrc",
            Method::Emr => "emr",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rise" => Some(Method::Rise),
            "mrc" => Some(Method::Mrc),
            "emr" => Some(Method::Emr),
            _ => None,
        }
    }
}

/// Method-specific parameters, recorded on the Calculation for reproducibility.
///
/// `Rise`/`Mrc` each carry the full [`Configuration`] snapshot used for the run,
/// not just the method-specific knobs, so a stored result is fully
/// reproducible (§9) — the same guarantee the original system's
/// `downsample_rule`/`downsample_method`/`filter_type`/`filter_window`
/// calculation columns provided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MethodParams {
    Rise {
        rise_threshold: f64,
        specific_yield: f64,
        config: Configuration,
    },
    Mrc {
        curve_id: i64,
        deviation_threshold: f64,
        specific_yield: f64,
        config: Configuration,
    },
    /// Extension point only; see the EMR open question (§9). No event-to-storm
    /// linkage is implemented.
    Emr,
}

/// A single recharge-attributable interval (§3).
#[derive(Debug, Clone)]
pub struct RechargeEvent {
    pub calculation_id: Option<i64>,
    pub event_ts: DateTime<Utc>,
    pub water_year: String,
    pub level: f64,
    pub predicted_level: f64,
    pub deviation: f64,
    pub recharge_value_inches: f64,
}

/// Per-water-year totals.
#[derive(Debug, Clone)]
pub struct YearlySummary {
    pub calculation_id: Option<i64>,
    pub water_year: String,
    pub total_recharge_in: f64,
    pub num_events: usize,
    pub annual_rate_in_per_yr: f64,
    pub max_deviation: f64,
    pub avg_deviation: f64,
}

/// The top-level result of a RISE or MRC run (§3).
#[derive(Debug, Clone)]
pub struct Calculation {
    pub id: Option<i64>,
    pub curve_id: Option<i64>,
    pub well_id: String,
    pub method: Method,
    pub params: MethodParams,
    pub total_recharge_in: f64,
    pub annual_rate_in_per_yr: f64,
    pub data_start_ts: DateTime<Utc>,
    pub data_end_ts: DateTime<Utc>,
    pub created_ts: DateTime<Utc>,
}
