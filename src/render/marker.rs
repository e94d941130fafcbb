use crate::core::geo::LatLng;
use crate::map::MarkerHandle;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A rendered marker paired with its last known position
///
/// The marker itself may only be queried on the looper thread; the cached
/// position can be read from anywhere. Clones share the position.
#[derive(Debug, Clone)]
pub struct MarkerWithPosition {
    marker: MarkerHandle,
    position: Arc<CachedPosition>,
}

#[derive(Debug)]
struct CachedPosition {
    lat: AtomicU64,
    lng: AtomicU64,
}

impl MarkerWithPosition {
    pub fn new(marker: MarkerHandle, position: LatLng) -> Self {
        Self {
            marker,
            position: Arc::new(CachedPosition {
                lat: AtomicU64::new(position.lat.to_bits()),
                lng: AtomicU64::new(position.lng.to_bits()),
            }),
        }
    }

    /// Must be called on the looper thread, where the marker can be queried
    pub fn from_marker(marker: MarkerHandle) -> Self {
        let position = marker.position();
        Self::new(marker, position)
    }

    pub fn marker(&self) -> &MarkerHandle {
        &self.marker
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(
            f64::from_bits(self.position.lat.load(Ordering::Acquire)),
            f64::from_bits(self.position.lng.load(Ordering::Acquire)),
        )
    }

    pub fn set_position(&self, position: LatLng) {
        self.position.lat.store(position.lat.to_bits(), Ordering::Release);
        self.position.lng.store(position.lng.to_bits(), Ordering::Release);
    }
}

impl PartialEq for MarkerWithPosition {
    fn eq(&self, other: &Self) -> bool {
        self.marker == other.marker
    }
}

impl Eq for MarkerWithPosition {}

impl Hash for MarkerWithPosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.marker.hash(state);
    }
}
