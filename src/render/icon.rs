//! Cluster icon descriptors
//!
//! Clusters share one icon per count band. The descriptor carries the label
//! and colour; rasterising it is the map adapter's job.

use crate::core::constants::{BUCKETS, CLUSTER_HUE_RANGE, CLUSTER_SIZE_RANGE};
use fxhash::FxHashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterIcon {
    pub bucket: usize,
    pub text: String,
    /// HSV hue in degrees; saturation 1.0 and value 0.6 are implied
    pub hue: f64,
}

impl ClusterIcon {
    pub fn for_bucket(bucket: usize) -> Self {
        Self {
            bucket,
            text: cluster_text(bucket),
            hue: cluster_hue(bucket),
        }
    }
}

/// Count band for a cluster of `size` items
pub fn bucket(size: usize) -> usize {
    if size <= BUCKETS[0] {
        return size;
    }
    BUCKETS
        .windows(2)
        .find(|band| size < band[1])
        .map(|band| band[0])
        .unwrap_or(BUCKETS[BUCKETS.len() - 1])
}

pub fn cluster_text(bucket: usize) -> String {
    if bucket < BUCKETS[0] {
        bucket.to_string()
    } else {
        format!("{}+", bucket)
    }
}

pub fn cluster_hue(size: usize) -> f64 {
    let size = (size as f64).min(CLUSTER_SIZE_RANGE);
    (CLUSTER_SIZE_RANGE - size).powi(2) / CLUSTER_SIZE_RANGE.powi(2) * CLUSTER_HUE_RANGE
}

/// Icon descriptors built lazily, one per bucket
#[derive(Debug, Default)]
pub struct IconCache {
    icons: Mutex<FxHashMap<usize, ClusterIcon>>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn icon_for_size(&self, size: usize) -> ClusterIcon {
        let bucket = bucket(size);
        match self.icons.lock() {
            Ok(mut icons) => icons
                .entry(bucket)
                .or_insert_with(|| ClusterIcon::for_bucket(bucket))
                .clone(),
            Err(_) => ClusterIcon::for_bucket(bucket),
        }
    }

    pub fn len(&self) -> usize {
        self.icons.lock().map(|icons| icons.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets() {
        assert_eq!(bucket(4), 4);
        assert_eq!(bucket(10), 10);
        assert_eq!(bucket(11), 10);
        assert_eq!(bucket(19), 10);
        assert_eq!(bucket(20), 20);
        assert_eq!(bucket(75), 50);
        assert_eq!(bucket(999), 500);
        assert_eq!(bucket(1000), 1000);
        assert_eq!(bucket(25_000), 1000);
    }

    #[test]
    fn test_cluster_text() {
        assert_eq!(cluster_text(7), "7");
        assert_eq!(cluster_text(10), "10+");
        assert_eq!(cluster_text(1000), "1000+");
    }

    #[test]
    fn test_hue_saturates() {
        assert_eq!(cluster_hue(0), CLUSTER_HUE_RANGE);
        assert_eq!(cluster_hue(300), 0.0);
        assert_eq!(cluster_hue(5000), 0.0);
        assert!(cluster_hue(10) > cluster_hue(100));
    }

    #[test]
    fn test_icon_cache_shares_per_bucket() {
        let cache = IconCache::new();
        let a = cache.icon_for_size(55);
        let b = cache.icon_for_size(99);
        assert_eq!(a, b);
        assert_eq!(a.text, "50+");
        assert_eq!(cache.len(), 1);
        cache.icon_for_size(5);
        assert_eq!(cache.len(), 2);
    }
}
