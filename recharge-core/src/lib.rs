//! Analytical core of a groundwater-recharge estimation engine.
//!
//! Given a well's water-level time series, this crate estimates aquifer
//! recharge using the RISE and MRC water-table-fluctuation methods (EMR is a
//! defined extension point only; see [`calculation::MethodParams::Emr`]).
//! GUI, plotting, file export, and database connection acquisition are out of
//! scope; the host integrates through [`host::DataSource`] and
//! [`repository::Repository`].

pub mod aggregate;
pub mod calculation;
pub mod config;
pub mod controller;
pub mod curve;
pub mod error;
pub mod fit;
pub mod host;
pub mod mrc;
pub mod preprocess;
pub mod quality;
pub mod recession;
pub mod repository;
pub mod rise;
pub mod series;
pub mod water_year;

pub use calculation::{Calculation, MethodParams, RechargeEvent, YearlySummary};
pub use config::Configuration;
pub use controller::AnalysisController;
pub use curve::{Curve, CurveType};
pub use error::RechargeError;
pub use host::DataSource;
pub use recession::RecessionSegment;
pub use repository::Repository;
pub use series::{Reading, Series};
