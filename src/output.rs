//! Render parameter output for the rendering collaborator.
//!
//! Supports pretty-printing, JSON files, CSV files, and the sweep index.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use tracing::debug;

use crate::pipeline::StationRender;
use crate::traffic::StationTraffic;

/// Logs a render set using Rust's debug pretty-print format.
pub fn print_pretty(params: &[StationRender]) {
    debug!("{:#?}", params);
}

/// Serializes a render set as pretty JSON.
pub fn to_json(params: &[StationRender]) -> Result<String> {
    Ok(serde_json::to_string_pretty(params)?)
}

/// Writes a render set to a JSON file, replacing any previous snapshot.
pub fn write_json(path: &str, params: &[StationRender]) -> Result<()> {
    debug!(path, stations = params.len(), "writing JSON render set");
    fs::write(path, to_json(params)?).with_context(|| format!("writing {path}"))?;
    Ok(())
}

/// Writes a render set to a CSV file with a header row, replacing any
/// previous snapshot.
pub fn write_csv(path: &str, params: &[StationRender]) -> Result<()> {
    debug!(path, stations = params.len(), "writing CSV render set");

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("writing {path}"))?;
    for render in params {
        writer.serialize(render)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes ranked station totals as pretty JSON.
pub fn write_station_totals(path: &str, totals: &[StationTraffic]) -> Result<()> {
    debug!(path, stations = totals.len(), "writing station totals");
    fs::write(path, serde_json::to_string_pretty(totals)?)
        .with_context(|| format!("writing {path}"))?;
    Ok(())
}

/// One entry of the sweep index: which snapshot file holds which minute.
#[derive(Debug, Serialize)]
pub struct SweepEntry {
    pub minute: u16,
    pub time: String,
    pub matched_trips: usize,
    pub file: String,
}

/// Top-level index of a sweep run, written as `index.json` next to the
/// per-minute snapshot files.
#[derive(Debug, Serialize)]
pub struct SweepIndex {
    pub generated_at: DateTime<Utc>,
    pub snapshots: Vec<SweepEntry>,
}

/// Writes the sweep index as pretty JSON.
pub fn write_index(path: &str, index: &SweepIndex) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(index)?)
        .with_context(|| format!("writing {path}"))?;
    Ok(())
}
