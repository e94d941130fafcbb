use crate::animation::interpolation::{EasingFunction, Interpolation};
use crate::core::geo::LatLng;
use crate::render::marker::MarkerWithPosition;
use instant::Instant;
use std::time::Duration;

/// Moves one marker from one position to another
#[derive(Debug, Clone)]
pub struct AnimationTask {
    pub marker: MarkerWithPosition,
    pub from: LatLng,
    pub to: LatLng,
    /// Remove the marker (and its cache entries) once it arrives
    pub remove_on_complete: bool,
}

impl AnimationTask {
    pub fn new(marker: MarkerWithPosition, from: LatLng, to: LatLng) -> Self {
        Self {
            marker,
            from,
            to,
            remove_on_complete: false,
        }
    }

    pub fn then_remove(mut self) -> Self {
        self.remove_on_complete = true;
        self
    }

    /// Position at an eased fraction in [0, 1]
    pub fn position_at(&self, fraction: f64) -> LatLng {
        if fraction >= 1.0 {
            return LatLng::wrapped(self.to.lat, self.to.lng);
        }
        Interpolation::lat_lng(&self.from, &self.to, fraction)
    }
}

/// A running animation, stepped once per frame on the looper thread
#[derive(Debug)]
pub struct Animator {
    task: AnimationTask,
    started_at: Instant,
    duration: Duration,
    easing: EasingFunction,
}

impl Animator {
    pub fn start(task: AnimationTask, duration: Duration, easing: EasingFunction) -> Self {
        log::trace!(
            "animating marker {} from ({:.5}, {:.5}) to ({:.5}, {:.5})",
            task.marker.marker().id(),
            task.from.lat,
            task.from.lng,
            task.to.lat,
            task.to.lng
        );
        Self {
            task,
            started_at: Instant::now(),
            duration,
            easing,
        }
    }

    /// Linear time progress in [0, 1]
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.started_at.elapsed().as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Moves the marker to the current interpolated position.
    /// Returns `true` once the animation has reached its target.
    pub fn step(&self) -> bool {
        let progress = self.progress();
        let position = self.task.position_at(self.easing.apply(progress));
        self.task.marker.marker().set_position(position);
        progress >= 1.0
    }

    pub fn into_task(self) -> AnimationTask {
        self.task
    }
}
