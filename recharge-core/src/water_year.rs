//! Water-year labelling.

use chrono::{DateTime, Datelike, Utc};

/// Map a timestamp to its water-year label given a configurable start (month, day).
///
/// A water year is a 12-month accounting period starting at `(start_month, start_day)`
/// and labelled `"YYYY-YYYY"` by its start and end calendar years. If `ts`'s
/// `(month, day)` falls on or after the start boundary, the water year begins in
/// `ts`'s calendar year; otherwise it began the previous calendar year.
///
/// # Arguments
///
/// * `ts`: The timestamp to label.
/// * `start_month`: The water-year start month (1..12).
/// * `start_day`: The water-year start day (1..31).
///
/// returns: `String`
pub fn water_year_of(ts: DateTime<Utc>, start_month: u32, start_day: u32) -> String {
    let start_year = if (ts.month(), ts.day()) >= (start_month, start_day) {
        ts.year()
    } else {
        ts.year() - 1
    };
    format!("{}-{}", start_year, start_year + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn boundary_before_start() {
        assert_eq!(water_year_of(dt(2023, 9, 30), 10, 1), "2022-2023");
    }

    #[test]
    fn boundary_on_start() {
        assert_eq!(water_year_of(dt(2023, 10, 1), 10, 1), "2023-2024");
    }

    #[test]
    fn calendar_year_default() {
        assert_eq!(water_year_of(dt(2023, 6, 15), 1, 1), "2023-2024");
        assert_eq!(water_year_of(dt(2023, 12, 31), 1, 1), "2023-2024");
    }

    #[test]
    fn total_ordering_across_years() {
        let a = water_year_of(dt(2020, 5, 1), 10, 1);
        let b = water_year_of(dt(2021, 5, 1), 10, 1);
        assert!(a < b);
    }
}
