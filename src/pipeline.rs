//! The recompute pipeline: from loaded datasets to per-station render
//! parameters.
//!
//! [`Pipeline`] is the context object handed to every trigger site:
//! it owns the immutable base data plus the render set from the most
//! recent recompute. Filter changes go through [`Pipeline::recompute`],
//! which rebuilds the whole render set; viewport-only changes re-read
//! [`Pipeline::render_params`] and re-project `lat`/`lon` externally.
//! Recomputes take `&mut self`, so a stale result can never overwrite a
//! newer one.

use serde::Serialize;
use tracing::debug;

use crate::filter::{TimeFilter, filter_trips_by_time};
use crate::model::{Station, Trip};
use crate::scale::{
    RADIUS_RANGE_ANY_TIME, RADIUS_RANGE_FILTERED, RadiusScale, departure_ratio, quantize_flow,
};
use crate::traffic::compute_station_traffic;

/// Everything the rendering collaborator needs to draw one station: its
/// identity, the raw coordinates to project, the circle radius, the
/// quantized flow class for color, and the tooltip label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRender {
    pub short_name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
    pub flow_ratio: f64,
    pub label: String,
}

/// Immutable base data plus the last computed render set.
pub struct Pipeline {
    stations: Vec<Station>,
    trips: Vec<Trip>,
    radius_domain_max: u32,
    filter: TimeFilter,
    matched_trips: usize,
    render: Vec<StationRender>,
}

impl Pipeline {
    /// Builds the pipeline from the loaded datasets and runs the initial
    /// unfiltered recompute.
    ///
    /// The radius domain is fixed here from the full dataset's maximum
    /// total traffic, so later filter changes cannot make circle sizes
    /// jump as the data narrows; they only switch the output range.
    pub fn new(stations: Vec<Station>, trips: Vec<Trip>) -> Self {
        let full_traffic = compute_station_traffic(&stations, &trips);
        let radius_domain_max = full_traffic
            .iter()
            .map(|s| s.total_traffic)
            .max()
            .unwrap_or(0);

        let mut pipeline = Pipeline {
            stations,
            trips,
            radius_domain_max,
            filter: TimeFilter::AnyTime,
            matched_trips: 0,
            render: Vec::new(),
        };
        pipeline.recompute(TimeFilter::AnyTime);
        pipeline
    }

    /// Rebuilds every station's render parameters for the given filter and
    /// returns the new set. Running this twice with the same filter yields
    /// identical output.
    pub fn recompute(&mut self, filter: TimeFilter) -> &[StationRender] {
        let filtered = filter_trips_by_time(&self.trips, filter);
        let enriched = compute_station_traffic(&self.stations, &filtered);

        let range = match filter {
            TimeFilter::AnyTime => RADIUS_RANGE_ANY_TIME,
            TimeFilter::At(_) => RADIUS_RANGE_FILTERED,
        };
        let radius_scale = RadiusScale::new(self.radius_domain_max, range);

        self.matched_trips = filtered.len();
        self.filter = filter;
        self.render = enriched
            .into_iter()
            .map(|station| {
                let ratio = departure_ratio(station.departures, station.total_traffic);
                StationRender {
                    radius: radius_scale.radius(station.total_traffic),
                    flow_ratio: quantize_flow(ratio),
                    label: format!(
                        "{} trips ({} departures, {} arrivals)",
                        station.total_traffic, station.departures, station.arrivals
                    ),
                    short_name: station.short_name,
                    lat: station.lat,
                    lon: station.lon,
                }
            })
            .collect();

        debug!(
            filter = %self.filter,
            matched_trips = self.matched_trips,
            stations = self.render.len(),
            "render parameters recomputed"
        );
        &self.render
    }

    /// The render set from the most recent recompute.
    pub fn render_params(&self) -> &[StationRender] {
        &self.render
    }

    /// The filter the current render set was computed with.
    pub fn filter(&self) -> TimeFilter {
        self.filter
    }

    /// How many trips the current filter admitted.
    pub fn matched_trips(&self) -> usize {
        self.matched_trips
    }

    /// Maximum total traffic over the full unfiltered dataset; the fixed
    /// radius domain.
    pub fn radius_domain_max(&self) -> u32 {
        self.radius_domain_max
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn station(short_name: &str) -> Station {
        Station {
            short_name: short_name.to_string(),
            name: None,
            lat: 42.36,
            lon: -71.09,
            capacity: None,
        }
    }

    fn trip(start_id: &str, end_id: &str, start_hm: (u32, u32), end_hm: (u32, u32)) -> Trip {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        Trip {
            start_station_id: start_id.to_string(),
            end_station_id: end_id.to_string(),
            started_at: date.and_hms_opt(start_hm.0, start_hm.1, 0).unwrap(),
            ended_at: date.and_hms_opt(end_hm.0, end_hm.1, 0).unwrap(),
        }
    }

    /// Four stations, four trips, morning-heavy; D is never touched.
    /// Full-set totals: A = 4 (2 dep + 2 arr), B = 3, C = 1, D = 0, so the
    /// radius domain max is 4.
    fn fixture() -> Pipeline {
        let stations = vec![station("A"), station("B"), station("C"), station("D")];
        let trips = vec![
            trip("A", "B", (8, 5), (8, 40)),
            trip("B", "A", (8, 50), (9, 2)),
            trip("A", "C", (9, 10), (9, 31)),
            trip("B", "A", (17, 30), (17, 49)),
        ];
        Pipeline::new(stations, trips)
    }

    #[test]
    fn test_new_runs_initial_recompute() {
        let pipeline = fixture();
        assert_eq!(pipeline.filter(), TimeFilter::AnyTime);
        assert_eq!(pipeline.matched_trips(), 4);
        assert_eq!(pipeline.render_params().len(), 4);
        assert_eq!(pipeline.radius_domain_max(), 4);
    }

    #[test]
    fn test_labels_render_counts() {
        let pipeline = fixture();
        let a = &pipeline.render_params()[0];
        assert_eq!(a.short_name, "A");
        assert_eq!(a.label, "4 trips (2 departures, 2 arrivals)");

        let c = &pipeline.render_params()[2];
        assert_eq!(c.label, "1 trips (0 departures, 1 arrivals)");
    }

    #[test]
    fn test_render_keeps_catalog_order() {
        let pipeline = fixture();
        let names: Vec<_> = pipeline
            .render_params()
            .iter()
            .map(|r| r.short_name.as_str())
            .collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut pipeline = fixture();
        let first = pipeline.recompute(TimeFilter::At(540)).to_vec();
        let second = pipeline.recompute(TimeFilter::At(540)).to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_radius_domain_survives_filter_changes() {
        let mut pipeline = fixture();
        pipeline.recompute(TimeFilter::At(1080));
        assert_eq!(pipeline.radius_domain_max(), 4);

        // At 18:00 only the evening B -> A trip matches, so A's filtered
        // total is 1 out of the fixed domain of 4: half the sqrt range
        // above the filtered floor of 3.
        assert_eq!(pipeline.matched_trips(), 1);
        let a = &pipeline.render_params()[0];
        assert!((a.radius - (3.0 + 47.0 * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_range_switches_with_filter_mode() {
        let mut pipeline = fixture();

        // D has zero traffic in every view; the filtered range floor still
        // keeps its circle visible at radius 3.
        pipeline.recompute(TimeFilter::At(1080));
        assert_eq!(pipeline.render_params()[3].radius, 3.0);

        // Unfiltered, zero maps to zero.
        pipeline.recompute(TimeFilter::AnyTime);
        assert_eq!(pipeline.render_params()[3].radius, 0.0);
    }

    #[test]
    fn test_flow_ratio_is_quantized() {
        let pipeline = fixture();
        // A: 2 departures of 4 total -> ratio 0.5 -> middle class.
        assert_eq!(pipeline.render_params()[0].flow_ratio, 0.5);
        // B: 2 departures of 3 total -> ratio 2/3 -> outbound class.
        assert_eq!(pipeline.render_params()[1].flow_ratio, 1.0);
        // C: all arrivals -> ratio 0 -> inbound class.
        assert_eq!(pipeline.render_params()[2].flow_ratio, 0.0);
    }

    #[test]
    fn test_zero_traffic_station_renders_without_nan() {
        let stations = vec![station("A")];
        let pipeline = Pipeline::new(stations, Vec::new());

        let a = &pipeline.render_params()[0];
        assert_eq!(a.flow_ratio, 0.0);
        assert_eq!(a.radius, 0.0);
        assert!(!a.radius.is_nan());
        assert_eq!(a.label, "0 trips (0 departures, 0 arrivals)");
    }

    #[test]
    fn test_later_recompute_replaces_earlier() {
        let mut pipeline = fixture();
        let initial = pipeline.render_params().to_vec();

        pipeline.recompute(TimeFilter::At(540));
        pipeline.recompute(TimeFilter::AnyTime);

        assert_eq!(pipeline.render_params(), &initial[..]);
        assert_eq!(pipeline.matched_trips(), 4);
    }

    #[test]
    fn test_no_matching_trips_renders_all_zero() {
        // One 08:05 -> 08:40 trip, filter at 10:00: endpoint minutes are
        // 485 and 520, both outside the +-60 window, so every station
        // renders zero traffic.
        let stations = vec![station("A"), station("B")];
        let trips = vec![trip("A", "B", (8, 5), (8, 40))];
        let mut pipeline = Pipeline::new(stations, trips);

        let unfiltered = pipeline.render_params();
        assert_eq!(unfiltered[0].label, "1 trips (1 departures, 0 arrivals)");
        assert_eq!(unfiltered[1].label, "1 trips (0 departures, 1 arrivals)");

        pipeline.recompute(TimeFilter::At(600));
        assert_eq!(pipeline.matched_trips(), 0);
        for render in pipeline.render_params() {
            assert_eq!(render.label, "0 trips (0 departures, 0 arrivals)");
        }
    }
}
