use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Represents a geographical coordinate with latitude and longitude
///
/// Equality and hashing compare the raw bit patterns of both components, so a
/// `LatLng` can key a cluster cache. Coordinates are never NaN in practice;
/// a NaN coordinate only ever equals a bit-identical NaN.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Creates a coordinate with the longitude normalised into [-180, 180)
    pub fn wrapped(lat: f64, lng: f64) -> Self {
        Self::new(lat, Self::wrap_lng(lng))
    }

    /// Wraps longitude to the [-180, 180) range
    pub fn wrap_lng(lng: f64) -> f64 {
        if (-180.0..180.0).contains(&lng) {
            return lng;
        }
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}

impl PartialEq for LatLng {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lng.to_bits() == other.lng.to_bits()
    }
}

impl Eq for LatLng {}

impl Hash for LatLng {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lng.to_bits().hash(state);
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A point in flat projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

impl From<[f64; 2]> for Point {
    fn from(coords: [f64; 2]) -> Self {
        Self::new(coords[0], coords[1])
    }
}

/// Represents a bounding box of geographical coordinates
///
/// A box whose west edge lies east of its east edge spans the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Degenerate bounds that contain exactly one point
    pub fn from_point(point: LatLng) -> Self {
        Self::new(point, point)
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && self.contains_lng(point.lng)
    }

    fn contains_lng(&self, lng: f64) -> bool {
        let (west, east) = (self.south_west.lng, self.north_east.lng);
        if west <= east {
            lng >= west && lng <= east
        } else {
            lng >= west || lng <= east
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashSet;

    #[test]
    fn test_wrap_lng() {
        assert_eq!(LatLng::wrap_lng(0.0), 0.0);
        assert_eq!(LatLng::wrap_lng(181.0), -179.0);
        assert_eq!(LatLng::wrap_lng(-181.0), 179.0);
        assert_eq!(LatLng::wrap_lng(180.0), -180.0);
        assert_eq!(LatLng::wrap_lng(540.0), -180.0);
    }

    #[test]
    fn test_lat_lng_hash_eq() {
        let mut set = FxHashSet::default();
        set.insert(LatLng::new(10.0, 20.0));
        assert!(set.contains(&LatLng::new(10.0, 20.0)));
        assert!(!set.contains(&LatLng::new(10.0, 20.5)));
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = LatLngBounds::from_coords(40.0, -75.0, 41.0, -73.0);
        assert!(bounds.contains(&LatLng::new(40.5, -74.0)));
        assert!(!bounds.contains(&LatLng::new(42.0, -74.0)));
    }

    #[test]
    fn test_bounds_across_antimeridian() {
        let bounds = LatLngBounds::from_coords(-10.0, 170.0, 10.0, -170.0);
        assert!(bounds.contains(&LatLng::new(0.0, 179.0)));
        assert!(bounds.contains(&LatLng::new(0.0, -175.0)));
        assert!(!bounds.contains(&LatLng::new(0.0, 0.0)));
    }

    #[test]
    fn test_degenerate_bounds() {
        let bounds = LatLngBounds::from_point(LatLng::default());
        assert!(bounds.contains(&LatLng::new(0.0, 0.0)));
        assert!(!bounds.contains(&LatLng::new(0.0, 0.1)));
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_squared(&b), 25.0);
        assert_eq!(b.distance_squared(&a), 25.0);
    }
}
