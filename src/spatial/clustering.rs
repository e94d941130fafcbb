//! Cluster data model and the clustering strategy contract
//!
//! How items get partitioned into clusters is up to the strategy; the
//! renderer only consumes the resulting set and the strategy's matching
//! distance.

use crate::core::geo::LatLng;
use fxhash::{FxHashMap, FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};

/// A single point the caller wants represented on the map
pub trait ClusterItem: Clone + Eq + Hash + Send + Sync + 'static {
    fn position(&self) -> LatLng;

    fn title(&self) -> Option<&str> {
        None
    }

    fn snippet(&self) -> Option<&str> {
        None
    }
}

/// An aggregate of one or more items sharing a representative position
///
/// Two clusters are equal when they share a position and contain the same
/// items the same number of times, regardless of order.
#[derive(Debug, Clone)]
pub struct Cluster<T> {
    position: LatLng,
    items: Vec<T>,
}

/// A clustering result, compared by value
pub type ClusterSet<T> = FxHashSet<Cluster<T>>;

impl<T: ClusterItem> Cluster<T> {
    pub fn new(position: LatLng, items: Vec<T>) -> Self {
        Self { position, items }
    }

    /// A cluster holding one item, placed on that item
    pub fn single(item: T) -> Self {
        Self::new(item.position(), vec![item])
    }

    /// A cluster placed at the mean position of its items
    pub fn centered(items: Vec<T>) -> Self {
        if items.is_empty() {
            return Self::new(LatLng::default(), items);
        }
        let count = items.len() as f64;
        let (lat, lng) = items.iter().fold((0.0, 0.0), |(lat, lng), item| {
            let position = item.position();
            (lat + position.lat, lng + position.lng)
        });
        Self::new(LatLng::new(lat / count, lng / count), items)
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items aggregated by this cluster
    pub fn size(&self) -> usize {
        self.items.len()
    }
}

impl<T: ClusterItem> PartialEq for Cluster<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.position != other.position || self.items.len() != other.items.len() {
            return false;
        }
        let mut counts: FxHashMap<&T, usize> = FxHashMap::default();
        for item in &self.items {
            *counts.entry(item).or_insert(0) += 1;
        }
        for item in &other.items {
            match counts.get_mut(item) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return false,
            }
        }
        true
    }
}

impl<T: ClusterItem> Eq for Cluster<T> {}

impl<T: ClusterItem> Hash for Cluster<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.hash(state);
        // order independent, like a set hash
        let items = self.items.iter().fold(0u64, |acc, item| {
            let mut hasher = FxHasher::default();
            item.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        });
        items.hash(state);
    }
}

/// Partitions items into clusters for a zoom level
pub trait ClusteringStrategy<T: ClusterItem>: Send + Sync {
    fn clusters(&self, zoom: f64) -> ClusterSet<T>;

    /// Largest distance, in projected pixels at the clustering zoom, between
    /// items grouped into one cluster. Used to match clusters across frames.
    fn max_distance_between_clustered_items(&self) -> f64;
}

/// A strategy that hands back a precomputed clustering result
#[derive(Debug, Clone)]
pub struct StaticClustering<T> {
    clusters: ClusterSet<T>,
    max_distance: f64,
}

impl<T: ClusterItem> StaticClustering<T> {
    pub fn new(clusters: ClusterSet<T>, max_distance: f64) -> Self {
        Self {
            clusters,
            max_distance,
        }
    }

    /// A strategy with no clusters, useful when only the distance matters
    pub fn with_max_distance(max_distance: f64) -> Self {
        Self::new(ClusterSet::default(), max_distance)
    }

    pub fn set_clusters(&mut self, clusters: ClusterSet<T>) {
        self.clusters = clusters;
    }
}

impl<T: ClusterItem> ClusteringStrategy<T> for StaticClustering<T> {
    fn clusters(&self, _zoom: f64) -> ClusterSet<T> {
        self.clusters.clone()
    }

    fn max_distance_between_clustered_items(&self) -> f64 {
        self.max_distance
    }
}
