//! Reading / Series types (§3). A `Series` is an ordered sequence of readings;
//! `raw_series` and `processed_series` are both represented by this same type,
//! distinguished only by which invariants the preprocessing pipeline has
//! established on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single water-level observation. Immutable, sourced externally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// The wall-clock UTC instant of the observation.
    pub timestamp: DateTime<Utc>,
    /// The water level (feet).
    pub level: f64,
}

/// An ordered sequence of [`Reading`]s.
///
/// After preprocessing, a `Series` is guaranteed to have no duplicate
/// timestamps, only finite `level` values, and strictly ascending timestamps
/// (and a uniform sampling interval if resampling was selected). A freshly
/// loaded `raw_series` carries none of these guarantees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    readings: Vec<Reading>,
}

impl Series {
    /// Build a series from an unordered, possibly duplicate-laden vector of readings.
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.readings.iter().map(|r| r.timestamp).collect()
    }

    pub fn levels(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.level).collect()
    }

    pub fn first(&self) -> Option<&Reading> {
        self.readings.first()
    }

    pub fn last(&self) -> Option<&Reading> {
        self.readings.last()
    }

    /// Returns the sub-slice of readings in `[start, end]` (inclusive), as a new `Series`.
    pub fn slice_inclusive(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Series {
        Series::new(
            self.readings
                .iter()
                .filter(|r| r.timestamp >= start && r.timestamp <= end)
                .copied()
                .collect(),
        )
    }

    pub(crate) fn from_readings(readings: Vec<Reading>) -> Self {
        Self { readings }
    }
}

impl IntoIterator for Series {
    type Item = Reading;
    type IntoIter = std::vec::IntoIter<Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.into_iter()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}

impl FromIterator<Reading> for Series {
    fn from_iter<T: IntoIterator<Item = Reading>>(iter: T) -> Self {
        Series::new(iter.into_iter().collect())
    }
}
