//! Drives the renderer against an in-memory map and prints each cycle.
//!
//! Run with `RUST_LOG=markercluster=debug cargo run --example headless`.

use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use markercluster::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Cafe {
    id: u32,
    name: String,
    position: LatLng,
}

impl ClusterItem for Cafe {
    fn position(&self) -> LatLng {
        self.position
    }

    fn title(&self) -> Option<&str> {
        Some(&self.name)
    }
}

struct PrintedMarker {
    id: MarkerId,
    position: Mutex<LatLng>,
    title: Mutex<Option<String>>,
    map: Arc<Mutex<HashMap<MarkerId, String>>>,
}

impl Marker for PrintedMarker {
    fn id(&self) -> MarkerId {
        self.id
    }

    fn position(&self) -> LatLng {
        *self.position.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_position(&self, position: LatLng) {
        *self.position.lock().unwrap_or_else(|e| e.into_inner()) = position;
    }

    fn title(&self) -> Option<String> {
        self.title.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_title(&self, title: Option<String>) {
        *self.title.lock().unwrap_or_else(|e| e.into_inner()) = title;
    }

    fn snippet(&self) -> Option<String> {
        None
    }

    fn set_snippet(&self, _snippet: Option<String>) {}

    fn set_icon(&self, _icon: MarkerIcon) {}

    fn set_visible(&self, _visible: bool) {}

    fn remove(&self) {
        self.map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

/// A map with no screen: markers are just labels in a table
struct HeadlessMap {
    next_id: AtomicU64,
    zoom: Mutex<f64>,
    markers: Arc<Mutex<HashMap<MarkerId, String>>>,
}

impl HeadlessMap {
    fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .markers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        labels.sort();
        labels
    }
}

impl MapView for HeadlessMap {
    fn add_marker(&self, layer: MarkerLayer, options: MarkerOptions) -> MarkerHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let label = match (&layer, &options.icon) {
            (MarkerLayer::Clusters, MarkerIcon::Cluster(icon)) => format!("cluster {}", icon.text),
            _ => options.title.clone().unwrap_or_else(|| format!("marker {}", id)),
        };
        self.markers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, label);
        MarkerHandle::from_marker(PrintedMarker {
            id,
            position: Mutex::new(options.position),
            title: Mutex::new(options.title),
            map: Arc::clone(&self.markers),
        })
    }

    fn visible_bounds(&self) -> markercluster::Result<LatLngBounds> {
        Ok(LatLngBounds::from_coords(48.0, 2.0, 49.5, 3.0))
    }

    fn zoom(&self) -> f64 {
        *self.zoom.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_marker_listener(&self, _layer: MarkerLayer, _listener: Option<MarkerListener>) {}
}

fn main() -> Result<()> {
    markercluster::logging::init();

    let cafes: Vec<Cafe> = ["Flore", "Deux Magots", "Procope", "Dome", "Rotonde"]
        .iter()
        .enumerate()
        .map(|(i, name)| Cafe {
            id: i as u32,
            name: name.to_string(),
            position: LatLng::new(48.85 + i as f64 * 0.002, 2.33 + i as f64 * 0.002),
        })
        .collect();

    let map = Arc::new(HeadlessMap {
        next_id: AtomicU64::new(1),
        zoom: Mutex::new(12.0),
        markers: Arc::new(Mutex::new(HashMap::new())),
    });
    let clustering: Arc<dyn ClusteringStrategy<Cafe>> =
        Arc::new(StaticClustering::with_max_distance(100.0));
    let renderer = DefaultClusterRenderer::builder(Arc::clone(&map) as Arc<dyn MapView>, clustering)
        .with_profile(RenderProfile::Smooth)
        .build()
        .context("failed to start the renderer")?;

    let (tx, rx) = unbounded();
    renderer.set_on_render_complete(Some(Arc::new(move |summary: &RenderSummary| {
        let _ = tx.send(summary.clone());
    })));

    let steps: Vec<(f64, Vec<Cluster<Cafe>>)> = vec![
        (12.0, vec![Cluster::centered(cafes.clone())]),
        (15.0, cafes.iter().cloned().map(Cluster::single).collect()),
        (14.0, vec![Cluster::centered(cafes.clone())]),
    ];
    for (zoom, clusters) in steps {
        *map.zoom.lock().unwrap_or_else(|e| e.into_inner()) = zoom;
        renderer.on_clusters_changed(clusters);
        let summary = rx
            .recv_timeout(Duration::from_secs(5))
            .context("render did not complete")?;
        println!(
            "zoom {:>4.1}: +{} -{} (in {}, out {}) -> {:?}",
            zoom,
            summary.created,
            summary.removed,
            summary.animated_in,
            summary.animated_out,
            map.labels()
        );
    }

    renderer.shutdown();
    Ok(())
}
