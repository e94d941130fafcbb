//! Prelude module for common markercluster types and traits
//!
//! This module re-exports the most commonly used types and traits for easy
//! importing with `use markercluster::prelude::*;`

pub use crate::core::{
    config::{RenderProfile, RendererOptions},
    geo::{LatLng, LatLngBounds, Point},
};

pub use crate::map::{
    MapView, Marker, MarkerEvent, MarkerHandle, MarkerIcon, MarkerId, MarkerLayer,
    MarkerListener, MarkerOptions,
};

pub use crate::spatial::clustering::{
    Cluster, ClusterItem, ClusterSet, ClusteringStrategy, StaticClustering,
};

pub use crate::render::{
    ClusterIcon, ClusterItemListener, ClusterListener, ClusterRendererHooks,
    DefaultClusterRenderer, DefaultHooks, RenderCompleteListener, RenderSummary,
    RendererBuilder,
};

pub use crate::animation::EasingFunction;

pub use crate::background::{Looper, SerialWorker, UiExecutor};

pub use crate::{Error, Result};
