//! Interfaces the renderer needs from the host map
//!
//! Vendor adapters implement [`MapView`] and [`Marker`]. Marker mutation
//! methods take `&self`; adapters are expected to forward them to the
//! widget, and the renderer only ever calls them from its looper thread.

use crate::core::geo::{LatLng, LatLngBounds};
use crate::render::icon::ClusterIcon;
use crate::Result;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Identifier a map adapter assigns to each marker it creates
pub type MarkerId = u64;

/// A marker on the map surface
pub trait Marker: Send + Sync {
    fn id(&self) -> MarkerId;

    fn position(&self) -> LatLng;

    fn set_position(&self, position: LatLng);

    fn title(&self) -> Option<String>;

    fn set_title(&self, title: Option<String>);

    fn snippet(&self) -> Option<String>;

    fn set_snippet(&self, snippet: Option<String>);

    fn set_icon(&self, icon: MarkerIcon);

    fn set_visible(&self, visible: bool);

    fn is_info_window_shown(&self) -> bool {
        false
    }

    fn show_info_window(&self) {}

    /// Removes the marker from the map surface
    fn remove(&self);
}

/// Shared handle to a marker, compared and hashed by marker id
#[derive(Clone)]
pub struct MarkerHandle(Arc<dyn Marker>);

impl MarkerHandle {
    pub fn new(marker: Arc<dyn Marker>) -> Self {
        Self(marker)
    }

    pub fn from_marker<M: Marker + 'static>(marker: M) -> Self {
        Self(Arc::new(marker))
    }
}

impl Deref for MarkerHandle {
    type Target = dyn Marker;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for MarkerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for MarkerHandle {}

impl Hash for MarkerHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id().hash(state);
    }
}

impl fmt::Debug for MarkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerHandle")
            .field("id", &self.0.id())
            .finish()
    }
}

/// Appearance of a marker
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MarkerIcon {
    /// The adapter's stock pin
    #[default]
    Default,
    Cluster(ClusterIcon),
}

/// Everything needed to create a marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: LatLng,
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub icon: MarkerIcon,
    pub visible: bool,
}

impl MarkerOptions {
    pub fn new(position: LatLng) -> Self {
        Self {
            position,
            title: None,
            snippet: None,
            icon: MarkerIcon::Default,
            visible: true,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn icon(mut self, icon: MarkerIcon) -> Self {
        self.icon = icon;
        self
    }
}

/// Marker collections on the map; item markers and cluster markers never mix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerLayer {
    Items,
    Clusters,
}

/// User interaction with a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerEvent {
    Click,
    InfoWindowClick,
    InfoWindowLongClick,
}

/// Receives marker events; returns `true` when the event was consumed
pub type MarkerListener = Arc<dyn Fn(MarkerEvent, &MarkerHandle) -> bool + Send + Sync>;

/// The host map as seen by the renderer
pub trait MapView: Send + Sync {
    fn add_marker(&self, layer: MarkerLayer, options: MarkerOptions) -> MarkerHandle;

    /// Currently visible region; may fail while the map is not laid out yet
    fn visible_bounds(&self) -> Result<LatLngBounds>;

    /// Current camera zoom level
    fn zoom(&self) -> f64;

    fn set_marker_listener(&self, layer: MarkerLayer, listener: Option<MarkerListener>);
}
