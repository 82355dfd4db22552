//! Rusqlite-backed persistence for curves, segments,
//! calculations, events, and yearly summaries.
//!
//! Adapted from the in-memory-`Connection`-behind-interior-mutability pattern
//! of a sibling crate's database layer, but `Mutex` in place of `Rc<RefCell<_>>`
//! so a `Repository` is `Send + Sync` and safe to share across the
//! one-connection-per-request model described in the concurrency design (§5).

mod schema;

use crate::calculation::{Calculation, Method, MethodParams, RechargeEvent, YearlySummary};
use crate::curve::{Curve, CurveType};
use crate::error::RepositoryError;
use crate::recession::RecessionSegment;
use crate::series::Series;
use chrono::{DateTime, Utc};
use log::{info, warn};
use rusqlite::{params, Connection, Transaction};
use std::sync::Mutex;

fn ts_to_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn text_to_ts(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RepositoryError::UnreadableSegmentBlob(-1))
}

/// Summary row for a curve's segment set, used by selection UIs (§4.9).
#[derive(Debug, Clone)]
pub struct SegmentSetSummary {
    pub curve_id: i64,
    pub created_ts: DateTime<Utc>,
    pub curve_type: CurveType,
    pub r_squared: f64,
    pub segment_count: i64,
}

pub struct Repository {
    conn: Mutex<Connection>,
}

impl Repository {
    /// Open (or create) an in-memory store with the schema applied.
    pub fn new_in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::create_schema())?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open (or create) a file-backed store with the schema applied.
    pub fn open(path: &str) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(schema::create_schema())?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Atomically persist a curve and its owned segments (§4.9).
    pub fn save_curve(&self, curve: &Curve, segments: &[RecessionSegment]) -> Result<i64, RepositoryError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let curve_id = insert_curve(&tx, curve)?;
        for segment in segments {
            insert_segment(&tx, segment, curve.well_id.as_str(), Some(curve_id))?;
        }

        tx.commit()?;
        info!("saved curve {curve_id} for well {} with {} segments", curve.well_id, segments.len());
        Ok(curve_id)
    }

    pub fn get_curves_for_well(&self, well_id: &str, active_only: bool) -> Result<Vec<Curve>, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let sql = if active_only {
            "SELECT * FROM curves WHERE well_id = ?1 AND is_active = 1 ORDER BY created_ts DESC"
        } else {
            "SELECT * FROM curves WHERE well_id = ?1 ORDER BY created_ts DESC"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![well_id], row_to_curve)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get_curve_details(&self, curve_id: i64) -> Result<(Curve, Vec<RecessionSegment>), RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let curve = conn.query_row("SELECT * FROM curves WHERE id = ?1", params![curve_id], row_to_curve)?;
        let (segments, _bad) = segments_for_curve(&conn, curve_id)?;
        Ok((curve, segments))
    }

    /// Segments for a curve; rows with a null/unparseable `data_blob` are
    /// dropped from the result (not reconstructed) per the legacy-blob policy.
    pub fn get_segments_for_curve(&self, curve_id: i64) -> Result<Vec<RecessionSegment>, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let (segments, _bad) = segments_for_curve(&conn, curve_id)?;
        Ok(segments)
    }

    pub fn get_all_segment_sets_for_well(&self, well_id: &str) -> Result<Vec<SegmentSetSummary>, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT c.id, c.created_ts, c.curve_type, c.r_squared,
                    (SELECT COUNT(*) FROM recession_segments s WHERE s.curve_id = c.id)
             FROM curves c WHERE c.well_id = ?1 ORDER BY c.created_ts DESC",
        )?;
        let rows = stmt.query_map(params![well_id], |row| {
            let curve_type_text: String = row.get(2)?;
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, curve_type_text, row.get::<_, f64>(3)?, row.get::<_, i64>(4)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (curve_id, created_ts, curve_type_text, r_squared, segment_count) = row?;
            out.push(SegmentSetSummary {
                curve_id,
                created_ts: text_to_ts(&created_ts)?,
                curve_type: CurveType::parse(&curve_type_text)
                    .ok_or(RepositoryError::UnreadableSegmentBlob(curve_id))?,
                r_squared,
                segment_count,
            });
        }
        Ok(out)
    }

    pub fn save_calculation(
        &self,
        calculation: &Calculation,
        events: &[RechargeEvent],
        summaries: &[YearlySummary],
    ) -> Result<i64, RepositoryError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let calc_id = insert_calculation(&tx, calculation)?;
        for event in events {
            insert_event(&tx, calc_id, event)?;
        }
        for summary in summaries {
            insert_summary(&tx, calc_id, summary)?;
        }

        tx.commit()?;
        info!(
            "saved calculation {calc_id} for well {} with {} events, {} summaries",
            calculation.well_id,
            events.len(),
            summaries.len()
        );
        Ok(calc_id)
    }

    pub fn get_calculations_for_curve(&self, curve_id: i64) -> Result<Vec<Calculation>, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM calculations WHERE curve_id = ?1 ORDER BY created_ts DESC")?;
        let rows = stmt.query_map(params![curve_id], row_to_calculation)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get_calculation_details(
        &self,
        calc_id: i64,
    ) -> Result<(Calculation, Vec<RechargeEvent>, Vec<YearlySummary>), RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let calculation =
            conn.query_row("SELECT * FROM calculations WHERE id = ?1", params![calc_id], row_to_calculation)?;

        let mut event_stmt = conn.prepare("SELECT * FROM recharge_events WHERE calculation_id = ?1 ORDER BY event_ts")?;
        let events = event_stmt
            .query_map(params![calc_id], row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary_stmt =
            conn.prepare("SELECT * FROM yearly_summaries WHERE calculation_id = ?1 ORDER BY water_year")?;
        let summaries = summary_stmt
            .query_map(params![calc_id], row_to_summary)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((calculation, events, summaries))
    }

    /// Cascade delete: segments, then events/summaries, then calculations
    /// referencing the curves, then the curves themselves, all in one
    /// transaction (§4.9).
    pub fn delete_curves_and_segments(&self, ids: &[i64]) -> Result<(), RepositoryError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        for &id in ids {
            tx.execute("DELETE FROM recession_segments WHERE curve_id = ?1", params![id])?;

            let calc_ids: Vec<i64> = {
                let mut stmt = tx.prepare("SELECT id FROM calculations WHERE curve_id = ?1")?;
                let ids = stmt.query_map(params![id], |row| row.get(0))?.collect::<Result<Vec<_>, _>>()?;
                ids
            };
            for calc_id in calc_ids {
                tx.execute("DELETE FROM recharge_events WHERE calculation_id = ?1", params![calc_id])?;
                tx.execute("DELETE FROM yearly_summaries WHERE calculation_id = ?1", params![calc_id])?;
            }
            tx.execute("DELETE FROM calculations WHERE curve_id = ?1", params![id])?;
            tx.execute("DELETE FROM curves WHERE id = ?1", params![id])?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Counts segments with a null/unparseable `data_blob`, scoped to
    /// `well_id` if given (§4.9, §9 legacy blob migration hazard).
    pub fn diagnose_segment_data(&self, well_id: Option<&str>) -> Result<usize, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let (sql, has_filter): (&str, bool) = match well_id {
            Some(_) => ("SELECT data_blob FROM recession_segments WHERE well_id = ?1", true),
            None => ("SELECT data_blob FROM recession_segments", false),
        };
        let mut stmt = conn.prepare(sql)?;
        let blobs: Vec<Option<String>> = if has_filter {
            stmt.query_map(params![well_id.unwrap()], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<_>, _>>()?
        };

        let bad = blobs
            .into_iter()
            .filter(|blob| match blob {
                None => true,
                Some(text) => serde_json::from_str::<Series>(text).is_err(),
            })
            .count();
        if bad > 0 {
            warn!("{bad} segment(s) have an unreadable data blob");
        }
        Ok(bad)
    }

    /// Deactivate `old_id`, linking `new_id` back to it as its parent (§3 lineage).
    pub fn update_curve_version(&self, old_id: i64, new_id: i64) -> Result<(), RepositoryError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("UPDATE curves SET is_active = 0 WHERE id = ?1", params![old_id])?;
        tx.execute("UPDATE curves SET parent_curve_id = ?1 WHERE id = ?2", params![old_id, new_id])?;
        tx.commit()?;
        Ok(())
    }
}

fn segments_for_curve(conn: &Connection, curve_id: i64) -> Result<(Vec<RecessionSegment>, usize), RepositoryError> {
    let mut stmt = conn.prepare("SELECT * FROM recession_segments WHERE curve_id = ?1 ORDER BY start_ts")?;
    let mut segments = Vec::new();
    let mut bad = 0usize;
    let rows = stmt.query_map(params![curve_id], row_to_segment_raw)?;
    for row in rows {
        match row?.into_segment() {
            Some(segment) => segments.push(segment),
            None => bad += 1,
        }
    }
    Ok((segments, bad))
}

fn insert_curve(tx: &Transaction, curve: &Curve) -> Result<i64, RepositoryError> {
    let params_blob = serde_json::to_string(&curve.params)?;
    tx.execute(
        "INSERT INTO curves (well_id, curve_type, params_blob, r_squared, rmse, recession_segments_count,
            data_start_ts, data_end_ts, description, version, parent_curve_id, is_active, is_manual, created_ts)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            curve.well_id,
            curve.curve_type.as_str(),
            params_blob,
            curve.r_squared,
            curve.rmse,
            curve.recession_segments_count as i64,
            ts_to_text(curve.data_start_ts),
            ts_to_text(curve.data_end_ts),
            curve.description,
            curve.version,
            curve.parent_curve_id,
            curve.is_active,
            curve.is_manual,
            ts_to_text(curve.created_ts),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_segment(
    tx: &Transaction,
    segment: &RecessionSegment,
    well_id: &str,
    curve_id: Option<i64>,
) -> Result<i64, RepositoryError> {
    let data_blob = serde_json::to_string(&segment.data)?;
    tx.execute(
        "INSERT INTO recession_segments (well_id, curve_id, start_ts, end_ts, duration_days, start_level,
            end_level, recession_rate, data_blob, quality, selected, created_ts)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            well_id,
            curve_id,
            ts_to_text(segment.start_ts),
            ts_to_text(segment.end_ts),
            segment.duration_days,
            segment.start_level,
            segment.end_level,
            segment.recession_rate,
            data_blob,
            segment.quality,
            segment.selected,
            ts_to_text(Utc::now()),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_calculation(tx: &Transaction, calculation: &Calculation) -> Result<i64, RepositoryError> {
    let params_blob = serde_json::to_string(&calculation.params)?;
    tx.execute(
        "INSERT INTO calculations (curve_id, well_id, method, params_blob, total_recharge, annual_rate,
            data_start_ts, data_end_ts, created_ts)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            calculation.curve_id,
            calculation.well_id,
            calculation.method.as_str(),
            params_blob,
            calculation.total_recharge_in,
            calculation.annual_rate_in_per_yr,
            ts_to_text(calculation.data_start_ts),
            ts_to_text(calculation.data_end_ts),
            ts_to_text(calculation.created_ts),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_event(tx: &Transaction, calc_id: i64, event: &RechargeEvent) -> Result<(), RepositoryError> {
    tx.execute(
        "INSERT INTO recharge_events (calculation_id, event_ts, water_year, level, predicted_level, deviation, recharge_value)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            calc_id,
            ts_to_text(event.event_ts),
            event.water_year,
            event.level,
            event.predicted_level,
            event.deviation,
            event.recharge_value_inches,
        ],
    )?;
    Ok(())
}

fn insert_summary(tx: &Transaction, calc_id: i64, summary: &YearlySummary) -> Result<(), RepositoryError> {
    tx.execute(
        "INSERT INTO yearly_summaries (calculation_id, water_year, total_recharge, num_events, annual_rate, max_deviation, avg_deviation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            calc_id,
            summary.water_year,
            summary.total_recharge_in,
            summary.num_events as i64,
            summary.annual_rate_in_per_yr,
            summary.max_deviation,
            summary.avg_deviation,
        ],
    )?;
    Ok(())
}

fn row_to_curve(row: &rusqlite::Row) -> rusqlite::Result<Curve> {
    let curve_type_text: String = row.get("curve_type")?;
    let params_blob: String = row.get("params_blob")?;
    let data_start_ts: String = row.get("data_start_ts")?;
    let data_end_ts: String = row.get("data_end_ts")?;
    let created_ts: String = row.get("created_ts")?;

    Ok(Curve {
        id: Some(row.get("id")?),
        well_id: row.get("well_id")?,
        curve_type: CurveType::parse(&curve_type_text).unwrap_or(CurveType::Linear),
        params: serde_json::from_str(&params_blob).unwrap_or((0.0, 0.0)),
        r_squared: row.get("r_squared")?,
        rmse: row.get("rmse")?,
        recession_segments_count: row.get::<_, i64>("recession_segments_count")? as usize,
        data_start_ts: DateTime::parse_from_rfc3339(&data_start_ts).unwrap().with_timezone(&Utc),
        data_end_ts: DateTime::parse_from_rfc3339(&data_end_ts).unwrap().with_timezone(&Utc),
        description: row.get("description")?,
        version: row.get("version")?,
        parent_curve_id: row.get("parent_curve_id")?,
        is_active: row.get("is_active")?,
        created_ts: DateTime::parse_from_rfc3339(&created_ts).unwrap().with_timezone(&Utc),
        is_manual: row.get("is_manual")?,
    })
}

struct RawSegmentRow {
    id: i64,
    curve_id: Option<i64>,
    start_ts: String,
    end_ts: String,
    duration_days: i64,
    start_level: f64,
    end_level: f64,
    recession_rate: f64,
    data_blob: Option<String>,
    quality: f64,
    selected: bool,
}

impl RawSegmentRow {
    fn into_segment(self) -> Option<RecessionSegment> {
        let data: Series = match self.data_blob {
            Some(text) => serde_json::from_str(&text).ok()?,
            None => return None,
        };
        Some(RecessionSegment {
            id: Some(self.id),
            curve_id: self.curve_id,
            start_ts: DateTime::parse_from_rfc3339(&self.start_ts).ok()?.with_timezone(&Utc),
            end_ts: DateTime::parse_from_rfc3339(&self.end_ts).ok()?.with_timezone(&Utc),
            duration_days: self.duration_days,
            start_level: self.start_level,
            end_level: self.end_level,
            recession_rate: self.recession_rate,
            data,
            quality: self.quality,
            selected: self.selected,
        })
    }
}

fn row_to_segment_raw(row: &rusqlite::Row) -> rusqlite::Result<RawSegmentRow> {
    Ok(RawSegmentRow {
        id: row.get("id")?,
        curve_id: row.get("curve_id")?,
        start_ts: row.get("start_ts")?,
        end_ts: row.get("end_ts")?,
        duration_days: row.get("duration_days")?,
        start_level: row.get("start_level")?,
        end_level: row.get("end_level")?,
        recession_rate: row.get("recession_rate")?,
        data_blob: row.get("data_blob")?,
        quality: row.get("quality")?,
        selected: row.get("selected")?,
    })
}

fn row_to_calculation(row: &rusqlite::Row) -> rusqlite::Result<Calculation> {
    let method_text: String = row.get("method")?;
    let params_blob: String = row.get("params_blob")?;
    let data_start_ts: String = row.get("data_start_ts")?;
    let data_end_ts: String = row.get("data_end_ts")?;
    let created_ts: String = row.get("created_ts")?;

    Ok(Calculation {
        id: Some(row.get("id")?),
        curve_id: row.get("curve_id")?,
        well_id: row.get("well_id")?,
        method: Method::parse(&method_text).unwrap_or(Method::Emr),
        params: serde_json::from_str(&params_blob).unwrap_or(MethodParams::Emr),
        total_recharge_in: row.get("total_recharge")?,
        annual_rate_in_per_yr: row.get("annual_rate")?,
        data_start_ts: DateTime::parse_from_rfc3339(&data_start_ts).unwrap().with_timezone(&Utc),
        data_end_ts: DateTime::parse_from_rfc3339(&data_end_ts).unwrap().with_timezone(&Utc),
        created_ts: DateTime::parse_from_rfc3339(&created_ts).unwrap().with_timezone(&Utc),
    })
}

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<RechargeEvent> {
    let event_ts: String = row.get("event_ts")?;
    Ok(RechargeEvent {
        calculation_id: Some(row.get("calculation_id")?),
        event_ts: DateTime::parse_from_rfc3339(&event_ts).unwrap().with_timezone(&Utc),
        water_year: row.get("water_year")?,
        level: row.get("level")?,
        predicted_level: row.get("predicted_level")?,
        deviation: row.get("deviation")?,
        recharge_value_inches: row.get("recharge_value")?,
    })
}

fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<YearlySummary> {
    Ok(YearlySummary {
        calculation_id: Some(row.get("calculation_id")?),
        water_year: row.get("water_year")?,
        total_recharge_in: row.get("total_recharge")?,
        num_events: row.get::<_, i64>("num_events")? as usize,
        annual_rate_in_per_yr: row.get("annual_rate")?,
        max_deviation: row.get("max_deviation")?,
        avg_deviation: row.get("avg_deviation")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Reading;
    use chrono::TimeZone;

    fn sample_curve() -> Curve {
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        Curve {
            id: None,
            well_id: "well-1".to_string(),
            curve_type: CurveType::Exponential,
            params: (5.0, 0.2),
            r_squared: 0.95,
            rmse: 0.1,
            recession_segments_count: 1,
            data_start_ts: ts,
            data_end_ts: ts,
            description: "test curve".to_string(),
            version: 1,
            parent_curve_id: None,
            is_active: true,
            created_ts: ts,
            is_manual: false,
        }
    }

    fn sample_segment() -> RecessionSegment {
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        RecessionSegment {
            id: None,
            curve_id: None,
            start_ts: ts,
            end_ts: ts + chrono::Duration::days(10),
            duration_days: 10,
            start_level: 10.0,
            end_level: 8.0,
            recession_rate: -0.2,
            data: Series::new(vec![
                Reading { timestamp: ts, level: 10.0 },
                Reading { timestamp: ts + chrono::Duration::days(10), level: 8.0 },
            ]),
            quality: 0.9,
            selected: true,
        }
    }

    #[test]
    fn save_and_fetch_curve_round_trips() {
        let repo = Repository::new_in_memory().unwrap();
        let curve = sample_curve();
        let segment = sample_segment();
        let curve_id = repo.save_curve(&curve, &[segment]).unwrap();

        let (fetched, segments) = repo.get_curve_details(curve_id).unwrap();
        assert_eq!(fetched.well_id, "well-1");
        assert_eq!(fetched.params, (5.0, 0.2));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration_days, 10);
    }

    #[test]
    fn get_curves_for_well_orders_by_created_ts_desc() {
        let repo = Repository::new_in_memory().unwrap();
        let mut older = sample_curve();
        older.created_ts = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let mut newer = sample_curve();
        newer.created_ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        repo.save_curve(&older, &[]).unwrap();
        repo.save_curve(&newer, &[]).unwrap();

        let curves = repo.get_curves_for_well("well-1", false).unwrap();
        assert_eq!(curves.len(), 2);
        assert!(curves[0].created_ts > curves[1].created_ts);
    }

    #[test]
    fn diagnose_segment_data_counts_null_blobs() {
        let repo = Repository::new_in_memory().unwrap();
        let curve = sample_curve();
        let curve_id = repo.save_curve(&curve, &[]).unwrap();
        {
            let conn = repo.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO recession_segments (well_id, curve_id, start_ts, end_ts, duration_days,
                    start_level, end_level, recession_rate, data_blob, quality, selected, created_ts)
                 VALUES ('well-1', ?1, '2023-01-01T00:00:00Z', '2023-01-10T00:00:00Z', 10, 10.0, 8.0, -0.2, NULL, 0.5, 1, '2023-01-01T00:00:00Z')",
                params![curve_id],
            )
            .unwrap();
        }
        let bad = repo.diagnose_segment_data(Some("well-1")).unwrap();
        assert_eq!(bad, 1);
    }

    #[test]
    fn save_calculation_round_trips_events_and_summaries() {
        let repo = Repository::new_in_memory().unwrap();
        let ts = Utc.with_ymd_and_hms(2023, 10, 1, 0, 0, 0).unwrap();
        let calc = Calculation {
            id: None,
            curve_id: None,
            well_id: "well-1".to_string(),
            method: Method::Rise,
            params: MethodParams::Rise {
                rise_threshold: 0.0,
                specific_yield: 0.2,
                config: crate::config::Configuration::default(),
            },
            total_recharge_in: 1.2,
            annual_rate_in_per_yr: 4.4,
            data_start_ts: ts,
            data_end_ts: ts,
            created_ts: ts,
        };
        let event = RechargeEvent {
            calculation_id: None,
            event_ts: ts,
            water_year: "2023-2024".to_string(),
            level: 10.0,
            predicted_level: 9.5,
            deviation: 0.5,
            recharge_value_inches: 1.2,
        };
        let summary = YearlySummary {
            calculation_id: None,
            water_year: "2023-2024".to_string(),
            total_recharge_in: 1.2,
            num_events: 1,
            annual_rate_in_per_yr: 4.4,
            max_deviation: 0.5,
            avg_deviation: 0.5,
        };

        let calc_id = repo.save_calculation(&calc, &[event], &[summary]).unwrap();
        let (fetched_calc, events, summaries) = repo.get_calculation_details(calc_id).unwrap();
        assert_eq!(fetched_calc.well_id, "well-1");
        assert_eq!(events.len(), 1);
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn delete_curves_and_segments_cascades() {
        let repo = Repository::new_in_memory().unwrap();
        let curve = sample_curve();
        let segment = sample_segment();
        let curve_id = repo.save_curve(&curve, &[segment]).unwrap();

        repo.delete_curves_and_segments(&[curve_id]).unwrap();

        let curves = repo.get_curves_for_well("well-1", false).unwrap();
        assert!(curves.is_empty());
        let segments = repo.get_segments_for_curve(curve_id).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn update_curve_version_deactivates_old_and_links_new() {
        let repo = Repository::new_in_memory().unwrap();
        let old_id = repo.save_curve(&sample_curve(), &[]).unwrap();
        let new_id = repo.save_curve(&sample_curve(), &[]).unwrap();

        repo.update_curve_version(old_id, new_id).unwrap();

        let (old_curve, _) = repo.get_curve_details(old_id).unwrap();
        let (new_curve, _) = repo.get_curve_details(new_id).unwrap();
        assert!(!old_curve.is_active);
        assert_eq!(new_curve.parent_curve_id, Some(old_id));
    }
}
