//! Marker rendering: the diff engine, the mutation scheduler and the facade

pub mod cache;
pub mod hooks;
pub mod icon;
pub mod marker;
pub mod modifier;
pub mod renderer;
pub mod task;

pub use cache::MarkerCache;
pub use hooks::{ClusterRendererHooks, DefaultHooks};
pub use icon::{ClusterIcon, IconCache};
pub use marker::MarkerWithPosition;
pub use modifier::{CycleStats, MarkerModifier};
pub use renderer::{
    ClusterItemListener, ClusterListener, DefaultClusterRenderer, RenderCompleteListener,
    RendererBuilder,
};
pub use task::{CreateMarkerTask, ProjectionSnapshot, RenderState, RenderSummary, RenderTask};
