use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// Easing curves for marker animations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    Linear,
    /// Decelerating curve `1 - (1 - t)^2`; markers settle into place
    #[default]
    Decelerate,
}

impl EasingFunction {
    /// Apply the easing function to a normalized time value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::Decelerate => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Main interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two f64 values
    pub fn linear(start: f64, end: f64, t: f64) -> f64 {
        start + (end - start) * t
    }

    /// Interpolates between two coordinates, crossing the antimeridian when
    /// that is the shorter way round. The result's longitude is normalised.
    pub fn lat_lng(from: &LatLng, to: &LatLng, t: f64) -> LatLng {
        let lat = Self::linear(from.lat, to.lat, t);
        let mut lng_delta = to.lng - from.lng;
        if lng_delta.abs() > 180.0 {
            lng_delta -= lng_delta.signum() * 360.0;
        }
        LatLng::wrapped(lat, from.lng + lng_delta * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_interpolation() {
        assert_eq!(Interpolation::linear(0.0, 10.0, 0.5), 5.0);
        assert_eq!(Interpolation::linear(0.0, 10.0, 0.0), 0.0);
        assert_eq!(Interpolation::linear(0.0, 10.0, 1.0), 10.0);
    }

    #[test]
    fn test_easing_functions() {
        assert_eq!(EasingFunction::Linear.apply(0.5), 0.5);
        assert_eq!(EasingFunction::Decelerate.apply(0.5), 0.75);
        assert_eq!(EasingFunction::Decelerate.apply(1.0), 1.0);
        assert_eq!(EasingFunction::Decelerate.apply(2.0), 1.0);
        assert_eq!(EasingFunction::Linear.apply(-1.0), 0.0);
    }

    #[test]
    fn test_lat_lng_interpolation() {
        let start = LatLng::new(0.0, 0.0);
        let end = LatLng::new(10.0, 10.0);
        assert_eq!(Interpolation::lat_lng(&start, &end, 0.5), LatLng::new(5.0, 5.0));
    }

    #[test]
    fn test_antimeridian_takes_short_arc() {
        let from = LatLng::new(0.0, 179.0);
        let to = LatLng::new(0.0, -179.0);
        for step in 0..=10 {
            let lng = Interpolation::lat_lng(&from, &to, step as f64 / 10.0).lng;
            assert!(lng.abs() >= 179.0 - 1e-9, "step {} went through {}", step, lng);
        }
        let mid = Interpolation::lat_lng(&from, &to, 0.5);
        assert!((mid.lng.abs() - 180.0).abs() < 1e-9);
        let end = Interpolation::lat_lng(&from, &to, 1.0);
        assert!((end.lng - -179.0).abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_westward() {
        let from = LatLng::new(10.0, -170.0);
        let to = LatLng::new(20.0, 170.0);
        let quarter = Interpolation::lat_lng(&from, &to, 0.25);
        assert!((quarter.lng - -175.0).abs() < 1e-9);
        assert!((quarter.lat - 12.5).abs() < 1e-9);
    }
}
