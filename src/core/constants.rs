//! Engine-wide defaults for cluster rendering.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Square tile size in pixels; the projected world is `TILE_SIZE * 2^zoom` wide.
pub const TILE_SIZE: f64 = 256.0;

/// Clusters with at least this many items render as a single cluster marker.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 4;

/// Duration of a marker animate-in or animate-out.
pub const DEFAULT_ANIMATION_DURATION_MS: u64 = 300;

/// Interval between animation frames on the looper.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Upper bound on marker mutations performed in one scheduling pass.
pub const DEFAULT_MAX_TASKS_PER_PASS: usize = 10;

/// Delay before a scheduling pass is re-armed while work remains.
pub const DEFAULT_REARM_INTERVAL_MS: u64 = 10;

/// Zooming out by this many levels or more skips removal animations.
pub const STEEP_ZOOM_OUT_LEVELS: f64 = 3.0;

/// Count bands used to share one cluster icon per magnitude.
pub const BUCKETS: [usize; 7] = [10, 20, 50, 100, 200, 500, 1000];

/// Cluster icon hue range in degrees (large clusters are red, small are blue).
pub const CLUSTER_HUE_RANGE: f64 = 220.0;

/// Cluster size at which the icon hue saturates.
pub const CLUSTER_SIZE_RANGE: f64 = 300.0;
