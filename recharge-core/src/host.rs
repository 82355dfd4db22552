//! External collaborator interfaces (§6). The host application (GUI, well
//! selection, session state, file export — all out of scope here) implements
//! these narrow traits; the core calls into them only through this surface.

use crate::series::Series;
use chrono::{DateTime, Utc};

/// Acquires raw readings for a well. Implemented by the host.
pub trait DataSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the standardized `(timestamp, level)` rows for `well_id`, optionally
    /// restricted to `time_range`.
    fn fetch_readings(
        &self,
        well_id: &str,
        time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Series, Self::Error>;
}
