//! Source data types: stations from the catalog, trips from the trip table.

use chrono::NaiveDateTime;
use serde::Deserialize;

/// A bike-share dock from the station catalog.
///
/// `short_name` is the id space the trip table's `start_station_id` /
/// `end_station_id` columns refer to, and the join key everywhere in this
/// crate. Traffic counts live in a separate derived record
/// ([`crate::traffic::StationTraffic`]); the catalog entry itself never
/// changes after load.
#[derive(Debug, Clone, Deserialize)]
pub struct Station {
    pub short_name: String,
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// One rental trip with normalized timestamps. Immutable once parsed.
///
/// Timestamps are naive wall-clock values: the time-of-day window is
/// defined on local hours and minutes, so no timezone is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub start_station_id: String,
    pub end_station_id: String,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}
