use crate::map::{MarkerHandle, MarkerId};
use fxhash::FxHashMap;
use std::hash::Hash;

/// Bidirectional mapping between rendered entities and their markers
///
/// Both directions are updated together; an entry never outlives its marker.
#[derive(Debug)]
pub struct MarkerCache<K> {
    markers: FxHashMap<K, MarkerHandle>,
    keys: FxHashMap<MarkerId, K>,
}

impl<K: Eq + Hash + Clone> MarkerCache<K> {
    pub fn new() -> Self {
        Self {
            markers: FxHashMap::default(),
            keys: FxHashMap::default(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&MarkerHandle> {
        self.markers.get(key)
    }

    pub fn get_key(&self, marker: &MarkerHandle) -> Option<&K> {
        self.keys.get(&marker.id())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.markers.contains_key(key)
    }

    pub fn put(&mut self, key: K, marker: MarkerHandle) {
        if let Some(previous) = self.markers.insert(key.clone(), marker.clone()) {
            self.keys.remove(&previous.id());
        }
        if let Some(stale) = self.keys.insert(marker.id(), key) {
            self.markers.remove(&stale);
        }
    }

    /// Purges the marker in both directions, returning the key it was cached under
    pub fn remove(&mut self, marker: &MarkerHandle) -> Option<K> {
        let key = self.keys.remove(&marker.id())?;
        self.markers.remove(&key);
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerHandle> {
        self.markers.values()
    }
}

impl<K: Eq + Hash + Clone> Default for MarkerCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::map::{Marker, MarkerIcon};

    struct StubMarker(MarkerId);

    impl Marker for StubMarker {
        fn id(&self) -> MarkerId {
            self.0
        }
        fn position(&self) -> LatLng {
            LatLng::default()
        }
        fn set_position(&self, _position: LatLng) {}
        fn title(&self) -> Option<String> {
            None
        }
        fn set_title(&self, _title: Option<String>) {}
        fn snippet(&self) -> Option<String> {
            None
        }
        fn set_snippet(&self, _snippet: Option<String>) {}
        fn set_icon(&self, _icon: MarkerIcon) {}
        fn set_visible(&self, _visible: bool) {}
        fn remove(&self) {}
    }

    fn marker(id: MarkerId) -> MarkerHandle {
        MarkerHandle::from_marker(StubMarker(id))
    }

    #[test]
    fn test_put_and_lookup_both_directions() {
        let mut cache = MarkerCache::new();
        cache.put("a", marker(1));
        assert_eq!(cache.get(&"a"), Some(&marker(1)));
        assert_eq!(cache.get_key(&marker(1)), Some(&"a"));
        assert!(cache.contains(&"a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_purges_both_directions() {
        let mut cache = MarkerCache::new();
        cache.put("a", marker(1));
        cache.put("b", marker(2));
        assert_eq!(cache.remove(&marker(1)), Some("a"));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get_key(&marker(1)), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.remove(&marker(1)), None);
    }

    #[test]
    fn test_rebinding_keeps_maps_in_lock_step() {
        let mut cache = MarkerCache::new();
        cache.put("a", marker(1));
        cache.put("a", marker(2));
        assert_eq!(cache.get_key(&marker(1)), None);
        assert_eq!(cache.get_key(&marker(2)), Some(&"a"));

        cache.put("b", marker(2));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&marker(2)));
        assert_eq!(cache.len(), 1);
    }
}
