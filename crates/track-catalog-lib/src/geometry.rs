//! Geographic value types: points and axis-aligned lat/lng bounding boxes
//!
//! Both types are plain `Copy` values. A [`BoundingBox`] never changes once built;
//! [`BoundingBox::extend`] and [`BoundingBox::combine`] return new boxes.

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this many points `from_points` folds sequentially
const PARALLEL_THRESHOLD: usize = 4096;

/// An immutable latitude/longitude pair in degrees
///
/// Equality is exact floating-point equality.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.latitude, self.longitude)
    }
}

/// geo uses x = longitude, y = latitude
impl From<geo::Point<f64>> for GeoPoint {
    #[inline]
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    #[inline]
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

impl From<&gpx::Waypoint> for GeoPoint {
    #[inline]
    fn from(waypoint: &gpx::Waypoint) -> Self {
        waypoint.point().into()
    }
}

/// An axis-aligned rectangle in latitude/longitude space
///
/// The empty box has its south-west corner at (+∞, +∞) and its north-east corner at
/// (−∞, −∞), so extending it with a first point yields a degenerate box on that point.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    south_west: GeoPoint,
    north_east: GeoPoint,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// The inverted box that every extension starts from
    #[inline]
    pub const fn empty() -> Self {
        Self {
            south_west: GeoPoint::new(f64::INFINITY, f64::INFINITY),
            north_east: GeoPoint::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create a box from two corners.
    ///
    /// The corners are not checked: `south_west` is trusted to be south-west of `north_east`.
    #[inline]
    pub const fn new(south_west: GeoPoint, north_east: GeoPoint) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Tightest box around all `points`, reduced in parallel for large inputs.
    ///
    /// Returns [`BoundingBox::empty`] when `points` is empty.
    pub fn from_points(points: &[GeoPoint]) -> Self {
        if points.len() < PARALLEL_THRESHOLD {
            return Self::from_points_seq(points.iter().copied());
        }

        points
            .par_iter()
            .fold(Accumulator::default, |mut acc, point| {
                acc.push(*point);
                acc
            })
            .map(Accumulator::freeze)
            .reduce(Self::empty, Self::combine)
    }

    /// Sequential variant of [`BoundingBox::from_points`]
    pub fn from_points_seq(points: impl IntoIterator<Item = GeoPoint>) -> Self {
        let mut acc = Accumulator::default();
        for point in points {
            acc.push(point);
        }
        acc.freeze()
    }

    #[inline]
    pub fn south_west(&self) -> GeoPoint {
        self.south_west
    }

    #[inline]
    pub fn north_east(&self) -> GeoPoint {
        self.north_east
    }

    /// Returns a new box grown to include `point`
    #[inline]
    pub fn extend(self, point: GeoPoint) -> Self {
        Self {
            south_west: GeoPoint::new(
                self.south_west.latitude.min(point.latitude),
                self.south_west.longitude.min(point.longitude),
            ),
            north_east: GeoPoint::new(
                self.north_east.latitude.max(point.latitude),
                self.north_east.longitude.max(point.longitude),
            ),
        }
    }

    /// Smallest box covering both boxes. Associative and commutative.
    #[inline]
    pub fn combine(self, other: Self) -> Self {
        Self {
            south_west: GeoPoint::new(
                self.south_west.latitude.min(other.south_west.latitude),
                self.south_west.longitude.min(other.south_west.longitude),
            ),
            north_east: GeoPoint::new(
                self.north_east.latitude.max(other.north_east.latitude),
                self.north_east.longitude.max(other.north_east.longitude),
            ),
        }
    }

    /// Strict interior test: points on an edge or corner are outside.
    #[inline]
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude > self.south_west.latitude
            && point.longitude > self.south_west.longitude
            && point.latitude < self.north_east.latitude
            && point.longitude < self.north_east.longitude
    }

    /// True while no point has been added (the box is inverted)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.south_west.latitude > self.north_east.latitude
            || self.south_west.longitude > self.north_east.longitude
    }

    pub fn center(&self) -> Option<GeoPoint> {
        if self.is_empty() {
            return None;
        }
        Some(GeoPoint::new(
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
        ))
    }

    /// Convert to a `geo::Rect` (x = longitude, y = latitude), `None` for the empty box
    pub fn to_rect(&self) -> Option<geo::Rect<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(geo::Rect::new(
            geo::Coord {
                x: self.south_west.longitude,
                y: self.south_west.latitude,
            },
            geo::Coord {
                x: self.north_east.longitude,
                y: self.north_east.latitude,
            },
        ))
    }
}

impl From<geo::Rect<f64>> for BoundingBox {
    fn from(rect: geo::Rect<f64>) -> Self {
        Self::new(
            GeoPoint::new(rect.min().y, rect.min().x),
            GeoPoint::new(rect.max().y, rect.max().x),
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[south west] {}\n[north east] {}",
            self.south_west, self.north_east
        )
    }
}

/// Mutable corner accumulator local to one reduction; frozen into a [`BoundingBox`]
struct Accumulator {
    min_lat: f64,
    min_lng: f64,
    max_lat: f64,
    max_lng: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            min_lat: f64::INFINITY,
            min_lng: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            max_lng: f64::NEG_INFINITY,
        }
    }
}

impl Accumulator {
    #[inline]
    fn push(&mut self, point: GeoPoint) {
        self.min_lat = self.min_lat.min(point.latitude);
        self.min_lng = self.min_lng.min(point.longitude);
        self.max_lat = self.max_lat.max(point.latitude);
        self.max_lng = self.max_lng.max(point.longitude);
    }

    #[inline]
    fn freeze(self) -> BoundingBox {
        BoundingBox::new(
            GeoPoint::new(self.min_lat, self.min_lng),
            GeoPoint::new(self.max_lat, self.max_lng),
        )
    }
}
