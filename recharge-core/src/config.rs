//! Configuration (§6): a plain, explicit collaborator rather than a settings
//! singleton — see the "Global/singleton state" design note.

use crate::error::PreprocessError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownsampleFrequency {
    None,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownsampleMethod {
    Mean,
    Median,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothingWindowType {
    Trailing,
    Centered,
}

/// Options recognized by the preprocessing pipeline and the analysis methods (§6).
/// `Serialize`/`Deserialize` let a run's exact settings travel with the
/// [`crate::calculation::Calculation`] that used them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Configuration {
    /// Multiplier from deviation (ft) to recharge (in). Must be in (0, 0.5].
    pub specific_yield: f64,
    /// Water-year start month (1..12).
    pub water_year_month: u32,
    /// Water-year start day (1..31).
    pub water_year_day: u32,
    pub downsample_frequency: DownsampleFrequency,
    pub downsample_method: DownsampleMethod,
    pub enable_smoothing: bool,
    pub smoothing_window: usize,
    pub smoothing_window_type: SmoothingWindowType,
    pub remove_outliers: bool,
    pub outlier_threshold: f64,
    pub rise_threshold: f64,
    pub min_recession_length: i64,
    pub fluctuation_tolerance: f64,
    pub mrc_deviation_threshold: f64,
    pub curve_type: crate::curve::CurveType,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            specific_yield: 0.2,
            water_year_month: 10,
            water_year_day: 1,
            downsample_frequency: DownsampleFrequency::None,
            downsample_method: DownsampleMethod::Mean,
            enable_smoothing: false,
            smoothing_window: 3,
            smoothing_window_type: SmoothingWindowType::Trailing,
            remove_outliers: false,
            outlier_threshold: 3.0,
            rise_threshold: 0.0,
            min_recession_length: 10,
            fluctuation_tolerance: 0.0,
            mrc_deviation_threshold: 0.1,
            curve_type: crate::curve::CurveType::Exponential,
        }
    }
}

impl Configuration {
    /// Validate the declared domains of each option (§6). Mirrors the bounds
    /// checking applied per-parameter.
    pub fn validate(&self) -> Result<(), PreprocessError> {
        if !(0.0 < self.specific_yield && self.specific_yield <= 0.5) {
            return Err(PreprocessError::InvalidParameter(
                "specific_yield".to_string(),
                format!("must be in (0, 0.5], got {}", self.specific_yield),
            ));
        }
        if !(1..=12).contains(&self.water_year_month) {
            return Err(PreprocessError::InvalidParameter(
                "water_year_month".to_string(),
                format!("must be 1..12, got {}", self.water_year_month),
            ));
        }
        if !(1..=31).contains(&self.water_year_day) {
            return Err(PreprocessError::InvalidParameter(
                "water_year_day".to_string(),
                format!("must be 1..31, got {}", self.water_year_day),
            ));
        }
        if self.smoothing_window < 2 {
            return Err(PreprocessError::InvalidParameter(
                "smoothing_window".to_string(),
                format!("must be >= 2, got {}", self.smoothing_window),
            ));
        }
        if self.outlier_threshold < 1.0 {
            return Err(PreprocessError::InvalidParameter(
                "outlier_threshold".to_string(),
                format!("must be >= 1.0, got {}", self.outlier_threshold),
            ));
        }
        if self.rise_threshold < 0.0 {
            return Err(PreprocessError::InvalidParameter(
                "rise_threshold".to_string(),
                format!("must be >= 0, got {}", self.rise_threshold),
            ));
        }
        if self.min_recession_length < 2 {
            return Err(PreprocessError::InvalidParameter(
                "min_recession_length".to_string(),
                format!("must be >= 2, got {}", self.min_recession_length),
            ));
        }
        if self.fluctuation_tolerance < 0.0 {
            return Err(PreprocessError::InvalidParameter(
                "fluctuation_tolerance".to_string(),
                format!("must be >= 0, got {}", self.fluctuation_tolerance),
            ));
        }
        if self.mrc_deviation_threshold <= 0.0 {
            return Err(PreprocessError::InvalidParameter(
                "mrc_deviation_threshold".to_string(),
                format!("must be > 0, got {}", self.mrc_deviation_threshold),
            ));
        }
        Ok(())
    }
}
