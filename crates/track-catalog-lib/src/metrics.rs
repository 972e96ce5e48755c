//! Distance and elevation reducers for track point sequences
//!
//! Distances use the haversine great-circle formula on a spherical Earth. Elevation gain
//! uses a noise threshold derived from the mean elevation of the track, see
//! [`total_elevation_gain`].

use crate::GeoPoint;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Earth's radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

pub const METERS_PER_KILOMETER: f64 = 1000.0;

/// Fraction of the mean elevation at or above which a single step counts as noise
pub const ELEVATION_NOISE_FACTOR: f64 = 0.25;

/// A track sample: position plus optional elevation in meters
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackPoint {
    pub point: GeoPoint,
    pub elevation: Option<f64>,
}

impl TrackPoint {
    #[inline]
    pub fn new(point: GeoPoint, elevation: Option<f64>) -> Self {
        Self { point, elevation }
    }
}

impl From<&gpx::Waypoint> for TrackPoint {
    #[inline]
    fn from(waypoint: &gpx::Waypoint) -> Self {
        Self::new(waypoint.into(), waypoint.elevation)
    }
}

/// Derived per-track values, computed once from the raw samples
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackMetrics {
    pub total_distance_meters: f64,
    pub total_elevation_gain_meters: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackMetrics {
    pub fn compute(samples: &[TrackPoint]) -> Self {
        Self {
            total_distance_meters: total_distance(samples.iter().map(|s| s.point)),
            total_elevation_gain_meters: total_elevation_gain(samples),
        }
    }

    #[inline]
    pub fn total_distance_kilometers(&self) -> f64 {
        self.total_distance_meters / METERS_PER_KILOMETER
    }
}

/// Calculate the Haversine distance between two points in meters
#[inline]
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Climb from `from` up to `to`: `max(0, to - from)`.
///
/// # Panics
/// If either sample lacks an elevation. Callers filter those out first.
#[inline]
pub fn elevation_gain(to: &TrackPoint, from: &TrackPoint) -> f64 {
    let (Some(to), Some(from)) = (to.elevation, from.elevation) else {
        panic!("elevation_gain called with a sample lacking elevation");
    };
    (to - from).max(0.0)
}

/// Sum of haversine distances between consecutive points; 0 for fewer than two points
pub fn total_distance(points: impl IntoIterator<Item = GeoPoint>) -> f64 {
    let mut points = points.into_iter();
    let Some(mut prev) = points.next() else {
        return 0.0;
    };

    let mut total = 0.0;
    for point in points {
        total += haversine_distance_meters(prev, point);
        prev = point;
    }
    total
}

/// Thresholded elevation gain over consecutive samples, oldest to newest.
///
/// Samples without elevation are dropped. The threshold is
/// [`ELEVATION_NOISE_FACTOR`] times the mean remaining elevation, and only per-step gains
/// strictly below it are summed; larger steps are treated as altimeter artifacts.
pub fn total_elevation_gain(samples: &[TrackPoint]) -> f64 {
    let with_elevation: Vec<&TrackPoint> =
        samples.iter().filter(|s| s.elevation.is_some()).collect();
    if with_elevation.is_empty() {
        return 0.0;
    }

    let mean = with_elevation
        .iter()
        .filter_map(|s| s.elevation)
        .sum::<f64>()
        / with_elevation.len() as f64;
    let threshold = mean * ELEVATION_NOISE_FACTOR;

    with_elevation
        .windows(2)
        .map(|pair| elevation_gain(pair[1], pair[0]))
        .filter(|gain| *gain < threshold)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng)
    }

    fn with_elevations(elevations: &[Option<f64>]) -> Vec<TrackPoint> {
        elevations
            .iter()
            .map(|e| TrackPoint::new(p(0.0, 0.0), *e))
            .collect()
    }

    fn elevations(values: &[f64]) -> Vec<TrackPoint> {
        with_elevations(&values.iter().copied().map(Some).collect::<Vec<_>>())
    }

    #[test]
    fn test_haversine_known_distance() {
        let a = p(40.0, 40.0);
        let b = p(41.0, 41.0);
        assert!((haversine_distance_meters(a, b) - 139700.0).abs() < 100.0);
        assert!((haversine_distance_meters(b, a) - 139700.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = p(51.5074, -0.1278);
        let b = p(48.8566, 2.3522);
        assert_eq!(haversine_distance_meters(a, b), haversine_distance_meters(b, a));
    }

    #[test]
    fn test_haversine_same_point() {
        let a = p(41.0, 41.0);
        assert!(haversine_distance_meters(a, a).abs() < 1.0);
    }

    #[test]
    fn test_total_distance_of_stationary_track() {
        let points = vec![p(40.0, 40.0); 10];
        assert!(total_distance(points).abs() < 1.0);
    }

    #[test]
    fn test_total_distance_along_meridian() {
        let points = [p(1.0, 0.0), p(1.1, 0.0), p(1.2, 0.0)];
        assert!((total_distance(points) - 22240.0).abs() < 100.0);
    }

    #[test]
    fn test_total_distance_short_inputs() {
        assert_eq!(total_distance(Vec::new()), 0.0);
        assert_eq!(total_distance([p(10.0, 10.0)]), 0.0);
    }

    #[test]
    fn test_elevation_gain_is_direction_sensitive() {
        let low = TrackPoint::new(p(0.0, 0.0), Some(100.0));
        let high = TrackPoint::new(p(0.0, 0.0), Some(150.0));
        assert_eq!(elevation_gain(&high, &low), 50.0);
        assert_eq!(elevation_gain(&low, &high), 0.0);
    }

    #[test]
    #[should_panic(expected = "lacking elevation")]
    fn test_elevation_gain_requires_elevation() {
        let a = TrackPoint::new(p(0.0, 0.0), Some(1.0));
        let b = TrackPoint::new(p(0.0, 0.0), None);
        elevation_gain(&a, &b);
    }

    #[test]
    fn test_total_elevation_discards_large_steps() {
        // Gains 100, 100, 0, 50 against a threshold of 90 * 0.25 = 22.5:
        // only the zero step is below it.
        let samples = elevations(&[0.0, 100.0, 200.0, 50.0, 100.0]);
        assert_eq!(total_elevation_gain(&samples), 0.0);
    }

    #[test]
    fn test_total_elevation_sums_small_steps() {
        // Mean 112.6, threshold 28.15; gains 10, 10, 0, 3
        let samples = elevations(&[100.0, 110.0, 120.0, 115.0, 118.0]);
        assert!((total_elevation_gain(&samples) - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_elevation_mixed_steps() {
        // Mean 152.5, threshold 38.125; the 95 m jump is dropped
        let samples = elevations(&[100.0, 105.0, 200.0, 205.0]);
        assert!((total_elevation_gain(&samples) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_elevation_step_equal_to_threshold_is_dropped() {
        // Mean 10, threshold 2.5; the step of exactly 2.5 does not count
        let samples = elevations(&[8.75, 11.25]);
        assert_eq!(total_elevation_gain(&samples), 0.0);
    }

    #[test]
    fn test_total_elevation_skips_missing_samples() {
        let samples = with_elevations(&[Some(100.0), None, Some(110.0), None]);
        assert!((total_elevation_gain(&samples) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_elevation_without_data() {
        assert_eq!(total_elevation_gain(&[]), 0.0);
        assert_eq!(total_elevation_gain(&with_elevations(&[None, None])), 0.0);
        assert_eq!(total_elevation_gain(&elevations(&[250.0])), 0.0);
    }

    #[test]
    fn test_total_elevation_descent_only() {
        let samples = elevations(&[300.0, 290.0, 280.0]);
        assert_eq!(total_elevation_gain(&samples), 0.0);
    }

    #[test]
    fn test_track_metrics_compute() {
        let samples = vec![
            TrackPoint::new(p(1.0, 0.0), Some(100.0)),
            TrackPoint::new(p(1.1, 0.0), Some(110.0)),
            TrackPoint::new(p(1.2, 0.0), None),
        ];
        let metrics = TrackMetrics::compute(&samples);
        assert!((metrics.total_distance_meters - 22240.0).abs() < 100.0);
        assert!((metrics.total_distance_kilometers() - 22.24).abs() < 0.1);
        assert!((metrics.total_elevation_gain_meters - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_track_point_from_waypoint() {
        let mut waypoint = gpx::Waypoint::new(geo::Point::new(13.4, 52.5));
        waypoint.elevation = Some(34.0);
        let sample = TrackPoint::from(&waypoint);
        assert_eq!(sample.point, p(52.5, 13.4));
        assert_eq!(sample.elevation, Some(34.0));
    }
}
