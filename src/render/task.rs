//! One render cycle: reconcile the previous marker generation with a new
//! cluster set.
//!
//! The cycle runs on the render worker. It only decides; every marker
//! mutation is enqueued on the [`MarkerModifier`] and performed on the
//! looper. The cycle is split in two phases, each ending in a drain:
//!
//! 1. create or reuse a marker for every new cluster, animating in from the
//!    nearest previous cluster when zooming in;
//! 2. remove every previous marker that was not reused, animating it into
//!    the nearest new cluster when zooming out gently.

use crate::core::config::RendererOptions;
use crate::core::geo::{LatLng, LatLngBounds};
use crate::map::MapView;
use crate::render::hooks::ClusterRendererHooks;
use crate::render::marker::MarkerWithPosition;
use crate::render::modifier::{CycleStats, MarkerModifier};
use crate::spatial::clustering::{Cluster, ClusterItem, ClusterSet};
use crate::spatial::index::CandidateIndex;
use crate::spatial::projection::SphericalMercatorProjection;
use crate::Result;
use fxhash::FxHashSet;
use std::sync::Arc;

/// Camera state captured when a render cycle starts
#[derive(Debug)]
pub struct ProjectionSnapshot {
    pub visible_bounds: Result<LatLngBounds>,
    pub zoom: f64,
}

impl ProjectionSnapshot {
    pub fn capture(map: &dyn MapView) -> Self {
        Self {
            visible_bounds: map.visible_bounds(),
            zoom: map.zoom(),
        }
    }

    /// Visible bounds, or bounds containing only the origin if the map could
    /// not report them
    pub fn bounds_or_origin(&self) -> LatLngBounds {
        match &self.visible_bounds {
            Ok(bounds) => *bounds,
            Err(e) => {
                log::warn!("visible region unavailable ({}); assuming only the origin is visible", e);
                LatLngBounds::from_point(LatLng::default())
            }
        }
    }
}

/// What is currently on screen, as committed by the last completed cycle
#[derive(Debug)]
pub struct RenderState<T> {
    pub clusters: Option<ClusterSet<T>>,
    pub zoom: Option<f64>,
    pub markers: FxHashSet<MarkerWithPosition>,
}

impl<T> Default for RenderState<T> {
    fn default() -> Self {
        Self {
            clusters: None,
            zoom: None,
            markers: FxHashSet::default(),
        }
    }
}

/// Outcome of one render cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSummary {
    /// The cluster set matched what was already rendered; nothing was touched
    pub unchanged: bool,
    pub zoom: f64,
    pub clusters: usize,
    pub created: usize,
    pub reused: usize,
    pub animated_in: usize,
    pub animated_out: usize,
    pub moved: usize,
    pub removed: usize,
}

impl RenderSummary {
    fn unchanged(zoom: f64, clusters: usize) -> Self {
        Self {
            unchanged: true,
            zoom,
            clusters,
            ..Self::default()
        }
    }

    fn from_stats(zoom: f64, clusters: usize, stats: CycleStats) -> Self {
        Self {
            unchanged: false,
            zoom,
            clusters,
            created: stats.created,
            reused: stats.reused,
            animated_in: stats.animated_in,
            animated_out: stats.animated_out,
            moved: stats.moved,
            removed: stats.removed,
        }
    }

    /// Total marker mutations performed by the cycle
    pub fn mutations(&self) -> usize {
        self.created + self.removed + self.animated_in + self.animated_out + self.moved
    }
}

/// Creates or reuses the marker(s) for one cluster
#[derive(Debug, Clone)]
pub struct CreateMarkerTask<T> {
    pub cluster: Cluster<T>,
    /// Render one cluster marker rather than one marker per item
    pub render_as_cluster: bool,
    pub animate_from: Option<LatLng>,
}

impl<T: ClusterItem> CreateMarkerTask<T> {
    pub fn new(cluster: Cluster<T>, render_as_cluster: bool, animate_from: Option<LatLng>) -> Self {
        Self {
            cluster,
            render_as_cluster,
            animate_from,
        }
    }
}

pub struct RenderTask<T> {
    clusters: ClusterSet<T>,
    snapshot: ProjectionSnapshot,
    options: RendererOptions,
    max_distance: f64,
}

impl<T: ClusterItem> RenderTask<T> {
    pub fn new(
        clusters: ClusterSet<T>,
        snapshot: ProjectionSnapshot,
        options: RendererOptions,
        max_distance: f64,
    ) -> Self {
        Self {
            clusters,
            snapshot,
            options,
            max_distance,
        }
    }

    /// Runs the cycle to completion. Blocks the calling thread on the
    /// modifier's drain, so it must not run on the looper.
    pub fn run(
        self,
        state: &mut RenderState<T>,
        modifier: &Arc<MarkerModifier<T>>,
        hooks: &dyn ClusterRendererHooks<T>,
    ) -> RenderSummary {
        let zoom = self.snapshot.zoom;
        if state.clusters.as_ref() == Some(&self.clusters) {
            log::debug!("cluster set unchanged at zoom {:.2}; skipping render", zoom);
            return RenderSummary::unchanged(zoom, self.clusters.len());
        }

        // The first cycle has nothing to animate from
        let previous_zoom = state.zoom.unwrap_or(zoom);
        let zooming_in = zoom > previous_zoom;
        let zoom_delta = zoom - previous_zoom;
        let animate = self.options.animate;
        let min_cluster_size = self.options.min_cluster_size;
        let visible_bounds = self.snapshot.bounds_or_origin();
        // The coarser zoom, not the finer one: matching distances are measured there
        let projection = SphericalMercatorProjection::for_zoom(zoom.min(previous_zoom));

        log::debug!(
            "rendering {} clusters at zoom {:.2} (delta {:+.2}, {} markers on screen)",
            self.clusters.len(),
            zoom,
            zoom_delta,
            state.markers.len()
        );

        let cluster_candidates = |clusters: &ClusterSet<T>| -> CandidateIndex<LatLng> {
            clusters
                .iter()
                .filter(|cluster| {
                    hooks.should_render_as_cluster(cluster, min_cluster_size)
                        && visible_bounds.contains(&cluster.position())
                })
                .map(|cluster| (projection.to_point(&cluster.position()), cluster.position()))
                .collect()
        };

        self.assert_items_rendered_once(hooks, min_cluster_size);
        modifier.begin_cycle(&self.options);

        // Phase 1: create or reuse
        let animate_from_candidates = match &state.clusters {
            Some(previous) if animate => cluster_candidates(previous),
            _ => CandidateIndex::empty(),
        };
        for cluster in &self.clusters {
            let on_screen = visible_bounds.contains(&cluster.position());
            let render_as_cluster = hooks.should_render_as_cluster(cluster, min_cluster_size);
            if zooming_in && on_screen && animate {
                let point = projection.to_point(&cluster.position());
                let animate_from = animate_from_candidates
                    .nearest_within(&point, self.max_distance)
                    .copied();
                modifier.enqueue_create(
                    true,
                    CreateMarkerTask::new(cluster.clone(), render_as_cluster, animate_from),
                );
            } else {
                modifier.enqueue_create(
                    false,
                    CreateMarkerTask::new(cluster.clone(), render_as_cluster, None),
                );
            }
        }
        modifier.drain();

        // Phase 2: remove what was not reused
        let new_markers = modifier.take_generation();
        let markers_to_remove: Vec<MarkerWithPosition> =
            state.markers.difference(&new_markers).cloned().collect();
        let animate_to_candidates = if animate {
            cluster_candidates(&self.clusters)
        } else {
            CandidateIndex::empty()
        };
        let gentle_zoom_out = !zooming_in && zoom_delta > -self.options.steep_zoom_out_levels;

        for marker in markers_to_remove {
            let position = marker.position();
            let on_screen = visible_bounds.contains(&position);
            if gentle_zoom_out && on_screen && animate {
                let point = projection.to_point(&position);
                match animate_to_candidates.nearest_within(&point, self.max_distance) {
                    Some(target) => modifier.enqueue_animate_then_remove(marker, position, *target),
                    None => modifier.enqueue_remove(true, marker.marker().clone()),
                }
            } else {
                modifier.enqueue_remove(on_screen, marker.marker().clone());
            }
        }
        modifier.drain();

        let summary = RenderSummary::from_stats(zoom, self.clusters.len(), modifier.take_stats());
        log::debug!(
            "render committed: {} created, {} reused, {} removed, {} animated in, {} animated out",
            summary.created,
            summary.reused,
            summary.removed,
            summary.animated_in,
            summary.animated_out
        );

        state.markers = new_markers;
        state.clusters = Some(self.clusters);
        state.zoom = Some(zoom);
        summary
    }

    /// Item markers are keyed by item, so an item rendered individually by
    /// two clusters would need the same marker twice.
    ///
    /// # Panics
    ///
    /// When an item is shared by two clusters that render as items.
    fn assert_items_rendered_once(
        &self,
        hooks: &dyn ClusterRendererHooks<T>,
        min_cluster_size: usize,
    ) {
        let mut seen: FxHashSet<&T> = FxHashSet::default();
        for cluster in &self.clusters {
            if hooks.should_render_as_cluster(cluster, min_cluster_size) {
                continue;
            }
            for item in cluster.items() {
                assert!(
                    seen.insert(item),
                    "item at ({:.5}, {:.5}) belongs to more than one cluster",
                    item.position().lat,
                    item.position().lng
                );
            }
        }
    }
}
