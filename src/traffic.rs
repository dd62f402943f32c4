//! Per-station traffic counts.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::{Station, Trip};

/// Departure and arrival counts keyed by station short name.
#[derive(Debug, Default)]
pub struct TrafficCounts {
    departures: HashMap<String, u32>,
    arrivals: HashMap<String, u32>,
}

impl TrafficCounts {
    /// Counts each trip once as a departure from its start station and once
    /// as an arrival at its end station. A round trip that starts and ends
    /// at the same dock contributes one of each to that dock.
    pub fn from_trips(trips: &[Trip]) -> Self {
        let mut counts = TrafficCounts::default();

        for trip in trips {
            *counts
                .departures
                .entry(trip.start_station_id.clone())
                .or_insert(0) += 1;
            *counts
                .arrivals
                .entry(trip.end_station_id.clone())
                .or_insert(0) += 1;
        }

        counts
    }

    /// Departure count for a station, zero when it never appears.
    pub fn departures_from(&self, short_name: &str) -> u32 {
        self.departures.get(short_name).copied().unwrap_or(0)
    }

    /// Arrival count for a station, zero when it never appears.
    pub fn arrivals_at(&self, short_name: &str) -> u32 {
        self.arrivals.get(short_name).copied().unwrap_or(0)
    }
}

/// A catalog station joined with its traffic counts for one trip set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTraffic {
    pub short_name: String,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub arrivals: u32,
    pub departures: u32,
    pub total_traffic: u32,
}

/// Joins traffic counts onto the station catalog.
///
/// Every catalog station appears in the result, in catalog order; stations
/// the trips never touch carry zero counts. Trips referencing ids absent
/// from the catalog contribute nothing here. The result is a full
/// replacement collection: only `short_name` is stable across calls.
pub fn compute_station_traffic(stations: &[Station], trips: &[Trip]) -> Vec<StationTraffic> {
    let counts = TrafficCounts::from_trips(trips);

    stations
        .iter()
        .map(|station| {
            let departures = counts.departures_from(&station.short_name);
            let arrivals = counts.arrivals_at(&station.short_name);
            StationTraffic {
                short_name: station.short_name.clone(),
                name: station.name.clone(),
                lat: station.lat,
                lon: station.lon,
                arrivals,
                departures,
                total_traffic: arrivals + departures,
            }
        })
        .collect()
}
