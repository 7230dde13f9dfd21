//! CSV export of per-tick grid snapshots.
//!
//! One row per source per tick. Output is deterministic for identical
//! grid state, so exports are diffable across runs.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::grid::PowerGrid;

/// Schema v1 column header for CSV telemetry export.
pub const TELEMETRY_SCHEMA_V1_HEADER: &str =
    "tick,bus,connected_loads,total_p_mw,total_q_mvar,loading_percent,voltage_pu,status";

/// Snapshot of one source at one tick.
#[derive(Debug, Clone)]
pub struct TelemetryRow {
    pub tick: u64,
    pub bus: String,
    pub connected_loads: usize,
    pub total_p_mw: f64,
    pub total_q_mvar: f64,
    pub loading_percent: f64,
    pub voltage_pu: f64,
    pub status: &'static str,
}

/// Captures one row per source from the current grid state.
pub fn snapshot_rows(grid: &PowerGrid) -> Vec<TelemetryRow> {
    grid.sources()
        .map(|source| TelemetryRow {
            tick: grid.ticks(),
            bus: source.bus.clone(),
            connected_loads: source.load_count(),
            total_p_mw: source.total_p_mw(),
            total_q_mvar: source.total_q_mvar(),
            loading_percent: source.loading_percent(),
            voltage_pu: source.voltage_pu(),
            status: source.status().as_str(),
        })
        .collect()
}

/// Writes telemetry rows as CSV to any writer.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_telemetry_csv(writer: impl Write, rows: &[TelemetryRow]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(TELEMETRY_SCHEMA_V1_HEADER.split(','))?;
    for r in rows {
        wtr.write_record(&[
            r.tick.to_string(),
            r.bus.clone(),
            r.connected_loads.to_string(),
            format!("{:.4}", r.total_p_mw),
            format!("{:.4}", r.total_q_mvar),
            format!("{:.6}", r.loading_percent),
            format!("{:.6}", r.voltage_pu),
            r.status.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports telemetry rows to a CSV file at the given path.
///
/// # Errors
///
/// Returns a `csv::Error` if file creation or writing fails.
pub fn export_csv(rows: &[TelemetryRow], path: &Path) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_telemetry_csv(buf, rows)
}
