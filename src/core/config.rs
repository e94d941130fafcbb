//! Configuration for cluster rendering behaviour
//!
//! Options can be picked from a preset profile, built by hand, or loaded from
//! JSON. Everything here is plain data; the renderer reads a snapshot of it
//! at the start of every render cycle.

use crate::animation::EasingFunction;
use crate::core::constants::{
    DEFAULT_ANIMATION_DURATION_MS, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_MAX_TASKS_PER_PASS,
    DEFAULT_MIN_CLUSTER_SIZE, DEFAULT_REARM_INTERVAL_MS, STEEP_ZOOM_OUT_LEVELS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderProfile {
    #[default]
    Balanced,
    /// No marker animations; every mutation is immediate
    Responsive,
    /// Longer animations and smaller scheduling passes
    Smooth,
    Custom(RendererOptions),
}

impl RenderProfile {
    pub fn resolve(&self) -> RendererOptions {
        match self {
            Self::Balanced => RendererOptions {
                animate: true,
                animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
                frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
                min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
                max_tasks_per_pass: DEFAULT_MAX_TASKS_PER_PASS,
                rearm_interval_ms: DEFAULT_REARM_INTERVAL_MS,
                steep_zoom_out_levels: STEEP_ZOOM_OUT_LEVELS,
                easing: EasingFunction::Decelerate,
            },
            Self::Responsive => RendererOptions {
                animate: false,
                animation_duration_ms: 0,
                frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
                min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
                max_tasks_per_pass: DEFAULT_MAX_TASKS_PER_PASS * 2,
                rearm_interval_ms: 5,
                steep_zoom_out_levels: STEEP_ZOOM_OUT_LEVELS,
                easing: EasingFunction::Decelerate,
            },
            Self::Smooth => RendererOptions {
                animate: true,
                animation_duration_ms: 450,
                frame_interval_ms: 8,
                min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
                max_tasks_per_pass: 5,
                rearm_interval_ms: DEFAULT_REARM_INTERVAL_MS,
                steep_zoom_out_levels: STEEP_ZOOM_OUT_LEVELS,
                easing: EasingFunction::Decelerate,
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Animate markers in on zoom-in and out on zoom-out
    pub animate: bool,
    pub animation_duration_ms: u64,
    pub frame_interval_ms: u64,
    /// Clusters smaller than this render as their individual items
    pub min_cluster_size: usize,
    pub max_tasks_per_pass: usize,
    pub rearm_interval_ms: u64,
    /// Removal animations are skipped when zooming out by this many levels or more
    pub steep_zoom_out_levels: f64,
    pub easing: EasingFunction,
}

impl Default for RendererOptions {
    fn default() -> Self {
        RenderProfile::default().resolve()
    }
}

impl RendererOptions {
    /// Parses options from JSON; missing fields fall back to the balanced profile.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tasks_per_pass == 0 {
            return Err(Error::Config("max_tasks_per_pass must be at least 1".into()));
        }
        if self.frame_interval_ms == 0 {
            return Err(Error::Config("frame_interval_ms must be at least 1".into()));
        }
        if self.steep_zoom_out_levels.is_nan() || self.steep_zoom_out_levels <= 0.0 {
            return Err(Error::Config(format!(
                "steep_zoom_out_levels must be positive, got {}",
                self.steep_zoom_out_levels
            )));
        }
        Ok(())
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn rearm_interval(&self) -> Duration {
        Duration::from_millis(self.rearm_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_balanced() {
        let options = RendererOptions::default();
        assert!(options.animate);
        assert_eq!(options.min_cluster_size, 4);
        assert_eq!(options.max_tasks_per_pass, 10);
        assert_eq!(options.animation_duration(), Duration::from_millis(300));
    }

    #[test]
    fn test_responsive_disables_animation() {
        assert!(!RenderProfile::Responsive.resolve().animate);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = RendererOptions::from_json(r#"{ "animate": false, "min_cluster_size": 2 }"#)
            .unwrap();
        assert!(!options.animate);
        assert_eq!(options.min_cluster_size, 2);
        assert_eq!(options.rearm_interval_ms, 10);
        assert_eq!(options.easing, EasingFunction::Decelerate);
    }

    #[test]
    fn test_easing_from_json() {
        let options = RendererOptions::from_json(r#"{ "easing": "linear" }"#).unwrap();
        assert_eq!(options.easing, EasingFunction::Linear);
        assert!(RendererOptions::from_json(r#"{ "easing": "bounce" }"#).is_err());
    }

    #[test]
    fn test_invalid_json_options() {
        assert!(RendererOptions::from_json(r#"{ "max_tasks_per_pass": 0 }"#).is_err());
        assert!(RendererOptions::from_json("not json").is_err());
    }
}
