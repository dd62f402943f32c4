//! Visual encoding scales derived from the traffic distribution.

/// Circle radius range in pixels when no time filter is active.
pub const RADIUS_RANGE_ANY_TIME: (f64, f64) = (0.0, 25.0);

/// Widened radius range while a time filter is active; counts inside a
/// narrow window are much smaller, so the floor and ceiling rise to keep
/// circles legible.
pub const RADIUS_RANGE_FILTERED: (f64, f64) = (3.0, 50.0);

/// Square-root scale from total traffic to a circle radius.
///
/// The domain is `[0, domain_max]` where `domain_max` comes from the full
/// unfiltered dataset and stays fixed across filter changes; only the
/// output range switches between filter modes. Area, not radius, then
/// tracks traffic linearly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale {
    domain_max: f64,
    range: (f64, f64),
}

impl RadiusScale {
    pub fn new(domain_max: u32, range: (f64, f64)) -> Self {
        Self {
            domain_max: f64::from(domain_max),
            range,
        }
    }

    /// Radius for a total traffic count. An all-zero distribution
    /// (`domain_max == 0`) maps everything to the range's low end rather
    /// than dividing by zero.
    pub fn radius(&self, total_traffic: u32) -> f64 {
        let (lo, hi) = self.range;
        if self.domain_max == 0.0 {
            return lo;
        }
        let position = (f64::from(total_traffic) / self.domain_max).clamp(0.0, 1.0);
        lo + (hi - lo) * position.sqrt()
    }
}

/// Fraction of a station's traffic that is outbound.
///
/// A station with no traffic has no defined ratio; the policy here is
/// `0.0` so nothing downstream ever sees NaN.
pub fn departure_ratio(departures: u32, total_traffic: u32) -> f64 {
    if total_traffic == 0 {
        0.0
    } else {
        f64::from(departures) / f64::from(total_traffic)
    }
}

/// Buckets a departure ratio in `[0, 1]` into one of three flow classes.
///
/// | Ratio         | Class |
/// |---------------|-------|
/// | `< 1/3`       | 0.0   |
/// | `[1/3, 2/3)`  | 0.5   |
/// | `>= 2/3`      | 1.0   |
pub fn quantize_flow(ratio: f64) -> f64 {
    match ratio {
        r if r < 1.0 / 3.0 => 0.0,
        r if r < 2.0 / 3.0 => 0.5,
        _ => 1.0,
    }
}
