use crate::core::constants::TILE_SIZE;
use crate::core::geo::{LatLng, Point};
use std::f64::consts::PI;

/// Spherical mercator projection onto a square world of `world_width` pixels
///
/// The origin is the north-west corner; x grows east, y grows south.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalMercatorProjection {
    world_width: f64,
}

impl SphericalMercatorProjection {
    pub fn new(world_width: f64) -> Self {
        Self { world_width }
    }

    /// Projection whose world width matches a map of 256px tiles at `zoom`
    pub fn for_zoom(zoom: f64) -> Self {
        Self::new(TILE_SIZE * 2_f64.powf(zoom))
    }

    pub fn world_width(&self) -> f64 {
        self.world_width
    }

    pub fn to_point(&self, lat_lng: &LatLng) -> Point {
        let x = lat_lng.lng / 360.0 + 0.5;
        let sin_y = lat_lng.lat.to_radians().sin();
        let y = 0.5 * ((1.0 + sin_y) / (1.0 - sin_y)).ln() / -(2.0 * PI) + 0.5;
        Point::new(x * self.world_width, y * self.world_width)
    }
}
