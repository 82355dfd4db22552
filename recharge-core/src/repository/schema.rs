//! SQL schema for the recharge-analysis store (§6, §4.9).
//!
//! Applied as a single batch on database open; every statement is
//! `IF NOT EXISTS` so opening an already-initialized file is a no-op.

pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS curves (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        well_id TEXT NOT NULL,
        curve_type TEXT NOT NULL,
        params_blob TEXT NOT NULL,
        r_squared REAL NOT NULL,
        rmse REAL NOT NULL,
        recession_segments_count INTEGER NOT NULL,
        data_start_ts TEXT NOT NULL,
        data_end_ts TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        version INTEGER NOT NULL,
        parent_curve_id INTEGER,
        is_active INTEGER NOT NULL,
        is_manual INTEGER NOT NULL,
        created_ts TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_curves_well ON curves(well_id);

    CREATE TABLE IF NOT EXISTS recession_segments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        well_id TEXT NOT NULL,
        curve_id INTEGER REFERENCES curves(id),
        start_ts TEXT NOT NULL,
        end_ts TEXT NOT NULL,
        duration_days INTEGER NOT NULL,
        start_level REAL NOT NULL,
        end_level REAL NOT NULL,
        recession_rate REAL NOT NULL,
        data_blob TEXT,
        quality REAL NOT NULL,
        selected INTEGER NOT NULL,
        created_ts TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_segments_well ON recession_segments(well_id);
    CREATE INDEX IF NOT EXISTS idx_segments_curve ON recession_segments(curve_id);

    CREATE TABLE IF NOT EXISTS calculations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        curve_id INTEGER REFERENCES curves(id),
        well_id TEXT NOT NULL,
        method TEXT NOT NULL,
        params_blob TEXT NOT NULL,
        total_recharge REAL NOT NULL,
        annual_rate REAL NOT NULL,
        data_start_ts TEXT NOT NULL,
        data_end_ts TEXT NOT NULL,
        created_ts TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_calculations_well ON calculations(well_id);

    CREATE TABLE IF NOT EXISTS recharge_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        calculation_id INTEGER NOT NULL REFERENCES calculations(id),
        event_ts TEXT NOT NULL,
        water_year TEXT NOT NULL,
        level REAL NOT NULL,
        predicted_level REAL NOT NULL,
        deviation REAL NOT NULL,
        recharge_value REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_events_calculation ON recharge_events(calculation_id);

    CREATE TABLE IF NOT EXISTS yearly_summaries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        calculation_id INTEGER NOT NULL REFERENCES calculations(id),
        water_year TEXT NOT NULL,
        total_recharge REAL NOT NULL,
        num_events INTEGER NOT NULL,
        annual_rate REAL NOT NULL,
        max_deviation REAL NOT NULL,
        avg_deviation REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_summaries_calculation ON yearly_summaries(calculation_id);
    "#
}
