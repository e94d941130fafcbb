//! # markercluster
//!
//! Renders clustered map markers without stalling the UI thread.
//!
//! Each new cluster set is diffed against what is on screen on a background
//! worker. The resulting marker creations, removals and animations are
//! performed on the UI thread in small bounded passes, and markers travel
//! between a cluster and its items when the camera zooms.

pub mod animation;
pub mod background;
pub mod core;
pub mod logging;
pub mod map;
pub mod prelude;
pub mod render;
pub mod spatial;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{RenderProfile, RendererOptions},
    geo::{LatLng, LatLngBounds, Point},
};

pub use map::{
    MapView, Marker, MarkerEvent, MarkerHandle, MarkerIcon, MarkerId, MarkerLayer,
    MarkerListener, MarkerOptions,
};

pub use spatial::clustering::{Cluster, ClusterItem, ClusterSet, ClusteringStrategy, StaticClustering};

pub use render::{
    ClusterRendererHooks, DefaultClusterRenderer, DefaultHooks, RenderSummary, RendererBuilder,
};

pub use animation::EasingFunction;

pub use background::{Looper, UiExecutor};

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Worker error: {0}")]
    Worker(String),
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;
