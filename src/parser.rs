//! Dataset decoding: station catalog JSON and trip table CSV.
//!
//! Trips are normalized here: the string timestamps in raw rows become
//! typed [`NaiveDateTime`]s. A row that cannot be normalized fails the
//! whole load so that no NaN-equivalent value ever reaches the
//! minute-of-day math downstream.

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::borrow::Cow;
use std::io::Read;

use crate::model::{Station, Trip};

/// Station catalog wire format: a nested `data.stations` array.
#[derive(Deserialize)]
struct StationCatalog {
    data: StationList,
}

#[derive(Deserialize)]
struct StationList {
    stations: Vec<Station>,
}

/// One raw row of the trip table. The published CSVs carry more columns
/// (`ride_id`, `rideable_type`, station names, member status); everything
/// not listed here is ignored.
#[derive(Debug, Deserialize)]
struct RawTrip {
    start_station_id: String,
    end_station_id: String,
    started_at: String,
    ended_at: String,
}

/// Timestamp layouts seen in published trip tables: space- or T-separated,
/// with optional fractional seconds.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Decodes the station catalog from raw JSON bytes.
///
/// Unknown fields are ignored; stations keep their catalog order.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON or the nested
/// `data.stations` structure is missing.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let catalog: StationCatalog =
        serde_json::from_slice(bytes).context("station catalog is not valid catalog JSON")?;
    Ok(catalog.data.stations)
}

/// Decodes and normalizes the trip table from raw CSV bytes.
///
/// Accepts plain or gzip-compressed input (sniffed from the magic bytes).
///
/// # Errors
///
/// Returns an error on the first malformed row or unparseable timestamp,
/// naming the row number and the offending value. A partially parsed trip
/// table is never returned.
pub fn parse_trips(bytes: &[u8]) -> Result<Vec<Trip>> {
    let bytes = maybe_gunzip(bytes)?;
    let mut reader = csv::Reader::from_reader(bytes.as_ref());

    let mut trips = Vec::new();
    for (idx, row) in reader.deserialize().enumerate() {
        // Header is row 1, so the first data row is row 2.
        let row_number = idx + 2;
        let raw: RawTrip =
            row.with_context(|| format!("trip table row {row_number} is malformed"))?;
        let trip = normalize_trip(raw).with_context(|| format!("trip table row {row_number}"))?;
        trips.push(trip);
    }

    Ok(trips)
}

/// Converts one raw row into a typed [`Trip`].
fn normalize_trip(raw: RawTrip) -> Result<Trip> {
    Ok(Trip {
        started_at: parse_timestamp(&raw.started_at)?,
        ended_at: parse_timestamp(&raw.ended_at)?,
        start_station_id: raw.start_station_id,
        end_station_id: raw.end_station_id,
    })
}

/// Parses a trip timestamp string, trying each known layout in turn.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    bail!("unparseable timestamp {value:?}")
}

/// Transparently decompresses gzip input, passing plain bytes through.
fn maybe_gunzip(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
    if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut decompressed = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut decompressed)
            .context("trip table looks gzipped but does not decompress")?;
        Ok(Cow::Owned(decompressed))
    } else {
        Ok(Cow::Borrowed(bytes))
    }
}
