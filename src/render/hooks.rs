//! Override points for marker appearance
//!
//! Hooks run on the looper thread, never while the scheduler lock is held.

use crate::map::{MarkerHandle, MarkerIcon, MarkerOptions};
use crate::render::icon::{bucket, ClusterIcon, IconCache};
use crate::spatial::clustering::{Cluster, ClusterItem};

pub trait ClusterRendererHooks<T: ClusterItem>: Send + Sync {
    /// Clusters below the threshold are rendered as their individual items
    fn should_render_as_cluster(&self, cluster: &Cluster<T>, min_cluster_size: usize) -> bool {
        cluster.size() >= min_cluster_size
    }

    /// Called before an item marker is added to the map
    fn on_before_cluster_item_rendered(&self, item: &T, options: &mut MarkerOptions) {
        match (item.title(), item.snippet()) {
            (Some(title), Some(snippet)) => {
                options.title = Some(title.to_string());
                options.snippet = Some(snippet.to_string());
            }
            (Some(title), None) => options.title = Some(title.to_string()),
            (None, Some(snippet)) => options.title = Some(snippet.to_string()),
            (None, None) => {}
        }
    }

    /// Called when an item is rendered again onto a marker that already exists
    fn on_cluster_item_updated(&self, item: &T, marker: &MarkerHandle) {
        let mut changed = false;
        let (title, snippet) = match (item.title(), item.snippet()) {
            (Some(title), snippet) => (Some(title), snippet),
            (None, Some(snippet)) => (Some(snippet), None),
            (None, None) => (None, None),
        };
        if let Some(title) = title {
            if marker.title().as_deref() != Some(title) {
                marker.set_title(Some(title.to_string()));
                changed = true;
            }
        }
        if let Some(snippet) = snippet {
            if marker.snippet().as_deref() != Some(snippet) {
                marker.set_snippet(Some(snippet.to_string()));
                changed = true;
            }
        }
        if marker.position() != item.position() {
            marker.set_position(item.position());
            changed = true;
        }
        if changed && marker.is_info_window_shown() {
            // refresh the open window with the new contents
            marker.show_info_window();
        }
    }

    /// Called before a cluster marker is added to the map
    fn on_before_cluster_rendered(&self, cluster: &Cluster<T>, options: &mut MarkerOptions) {
        options.icon = MarkerIcon::Cluster(ClusterIcon::for_bucket(bucket(cluster.size())));
    }

    /// Called when a cluster is rendered again onto a marker that already exists
    fn on_cluster_updated(&self, cluster: &Cluster<T>, marker: &MarkerHandle) {
        marker.set_icon(MarkerIcon::Cluster(ClusterIcon::for_bucket(bucket(
            cluster.size(),
        ))));
    }

    /// Called after an item marker was created or reused
    fn on_cluster_item_rendered(&self, _item: &T, _marker: &MarkerHandle) {}

    /// Called after a cluster marker was created or reused
    fn on_cluster_rendered(&self, _cluster: &Cluster<T>, _marker: &MarkerHandle) {}
}

/// Stock appearance: item titles and snippets, bucketed cluster icons
#[derive(Debug, Default)]
pub struct DefaultHooks {
    icons: IconCache,
}

impl DefaultHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn icons(&self) -> &IconCache {
        &self.icons
    }
}

impl<T: ClusterItem> ClusterRendererHooks<T> for DefaultHooks {
    fn on_before_cluster_rendered(&self, cluster: &Cluster<T>, options: &mut MarkerOptions) {
        options.icon = MarkerIcon::Cluster(self.icons.icon_for_size(cluster.size()));
    }

    fn on_cluster_updated(&self, cluster: &Cluster<T>, marker: &MarkerHandle) {
        marker.set_icon(MarkerIcon::Cluster(self.icons.icon_for_size(cluster.size())));
    }
}
