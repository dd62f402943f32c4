//! Time-of-day filtering of trips.

use anyhow::{Result, bail};
use chrono::{NaiveDateTime, Timelike};
use std::borrow::Cow;
use std::fmt;

use crate::model::Trip;

/// Half-width of the match window around the selected minute.
pub const WINDOW_MINUTES: i32 = 60;

/// Largest valid minute of day (23:59).
pub const LAST_MINUTE: u16 = 1439;

/// The time-of-day filter driven by the UI slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    /// No filter: every trip counts.
    AnyTime,
    /// Trips near this minute of day, in `[0, 1439]`.
    At(u16),
}

impl TimeFilter {
    /// Builds a filter from the raw slider value, `-1` meaning any time.
    ///
    /// # Errors
    ///
    /// Returns an error for values outside `[-1, 1439]`.
    pub fn from_slider(value: i32) -> Result<Self> {
        match value {
            -1 => Ok(TimeFilter::AnyTime),
            0..=1439 => Ok(TimeFilter::At(value as u16)),
            _ => bail!("time filter {value} is outside [-1, 1439]"),
        }
    }

    /// The slider encoding of this filter, `-1` for [`TimeFilter::AnyTime`].
    pub fn slider_value(self) -> i32 {
        match self {
            TimeFilter::AnyTime => -1,
            TimeFilter::At(minute) => i32::from(minute),
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFilter::AnyTime => write!(f, "any time"),
            TimeFilter::At(minute) => write!(f, "{}", format_minute_of_day(*minute)),
        }
    }
}

/// Minutes since local midnight, in `[0, 1439]`.
pub fn minutes_since_midnight(t: NaiveDateTime) -> u16 {
    (t.hour() * 60 + t.minute()) as u16
}

/// Selects the trips relevant to the given filter.
///
/// With [`TimeFilter::AnyTime`] the input slice is returned borrowed, no
/// copy made. Otherwise the result is the subsequence of trips, in their
/// original order, where either endpoint's minute of day lies within
/// [`WINDOW_MINUTES`] of the selected minute.
///
/// The window compares raw minute-of-day values and never wraps around
/// midnight: a trip ending at 23:50 does not match a filter of 00:10 even
/// though they are 20 real minutes apart.
pub fn filter_trips_by_time(trips: &[Trip], filter: TimeFilter) -> Cow<'_, [Trip]> {
    match filter {
        TimeFilter::AnyTime => Cow::Borrowed(trips),
        TimeFilter::At(minute) => Cow::Owned(
            trips
                .iter()
                .filter(|trip| trip_matches(trip, minute))
                .cloned()
                .collect(),
        ),
    }
}

fn trip_matches(trip: &Trip, minute: u16) -> bool {
    let selected = i32::from(minute);
    let started = i32::from(minutes_since_midnight(trip.started_at));
    let ended = i32::from(minutes_since_midnight(trip.ended_at));
    (started - selected).abs() <= WINDOW_MINUTES || (ended - selected).abs() <= WINDOW_MINUTES
}

/// Formats a minute of day on a short 12-hour clock, e.g. `8:05 AM`.
///
/// Values past 23:59 wrap around midnight, so a [`TimeFilter::At`] built
/// without [`TimeFilter::from_slider`] still renders as a real clock time.
pub fn format_minute_of_day(minute: u16) -> String {
    let minute = minute % (LAST_MINUTE + 1);
    let hour = minute / 60;
    let minutes = minute % 60;
    let (hour12, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{hour12}:{minutes:02} {meridiem}")
}
