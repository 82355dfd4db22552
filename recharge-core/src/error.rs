use thiserror::Error;

/// Errors raised while conditioning a raw series into an analysis-grade one.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("the series has fewer than 2 valid rows after preprocessing")]
    InsufficientData,
    #[error("timestamp '{0}' could not be interpreted")]
    InvalidTimestamp(String),
    #[error("level '{0}' could not be interpreted")]
    InvalidLevel(String),
    #[error("the '{0}' configuration value is invalid: {1}")]
    InvalidParameter(String, String),
}

/// Errors raised while identifying recession segments.
#[derive(Error, Debug)]
pub enum RecessionError {
    #[error("min_recession_length must be at least 2 days, got {0}")]
    InvalidMinLength(i64),
    #[error("fluctuation_tolerance must be >= 0, got {0}")]
    InvalidTolerance(f64),
}

/// Errors raised while fitting a drawdown curve.
#[derive(Error, Debug)]
pub enum FitError {
    #[error("no initial guess converged for curve type {0:?}")]
    DidNotConverge(crate::curve::CurveType),
    #[error("at least one recession segment is required to fit a curve")]
    NoSegments,
    #[error("manual fit parameters are out of range: {0}")]
    InvalidParameters(String),
}

/// Errors raised by the RISE / MRC methods.
#[derive(Error, Debug)]
pub enum MethodError {
    #[error("specific yield must be in (0, 0.5], got {0}")]
    InvalidSpecificYield(f64),
    #[error("deviation threshold must be > 0, got {0}")]
    InvalidDeviationThreshold(f64),
    #[error("RISE requires trailing smoothing; centered smoothing was configured")]
    CenteredSmoothingForbidden,
    #[error("the curve has no usable parameters for the MRC prediction")]
    InvalidCurve,
}

/// Errors raised by the repository.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("segment data blob is null or unparseable for segment {0}")]
    UnreadableSegmentBlob(i64),
    #[error("curve {0} does not belong to well '{1}'")]
    CurveWellMismatch(i64, String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Cancellation, checked cooperatively between pipeline stages (§5).
#[derive(Error, Debug)]
#[error("analysis was cancelled")]
pub struct Cancelled;

/// Crate-level aggregate error returned by [`crate::controller::AnalysisController`].
#[derive(Error, Debug)]
pub enum RechargeError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Recession(#[from] RecessionError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Method(#[from] MethodError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// Raised when the host's `DataSource` implementation fails (§6).
    #[error("data source error: {0}")]
    DataSource(Box<dyn std::error::Error + Send + Sync>),
}

impl RechargeError {
    /// A short remediation hint for user-visible surfacing, per the (kind, message,
    /// offending value, remediation hint) contract in the error handling design.
    pub fn remediation(&self) -> &'static str {
        match self {
            RechargeError::Preprocess(PreprocessError::InsufficientData) => {
                "collect a longer time series or relax the downsampling/smoothing settings"
            }
            RechargeError::Preprocess(PreprocessError::InvalidTimestamp(_)) => {
                "check the source timestamp format"
            }
            RechargeError::Preprocess(PreprocessError::InvalidLevel(_)) => {
                "check the source level column for non-numeric values"
            }
            RechargeError::Preprocess(PreprocessError::InvalidParameter(_, _)) => {
                "adjust the offending configuration value to a supported range"
            }
            RechargeError::Recession(_) => "adjust min_recession_length or fluctuation_tolerance",
            RechargeError::Fit(FitError::DidNotConverge(_)) => {
                "try manual parameter entry or a different curve type"
            }
            RechargeError::Fit(_) => "review the selected recession segments",
            RechargeError::Method(MethodError::CenteredSmoothingForbidden) => {
                "switch smoothing_window_type to Trailing for RISE"
            }
            RechargeError::Method(_) => "review the method parameters",
            RechargeError::Repository(_) => "check the repository connection and retry",
            RechargeError::Cancelled(_) => "re-run the analysis",
            RechargeError::DataSource(_) => "check the host data source and retry",
        }
    }
}
