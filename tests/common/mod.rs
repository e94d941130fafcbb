//! Recording map double shared by the integration tests
#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver, Sender};
use fxhash::{FxHashMap, FxHashSet};
use markercluster::prelude::*;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// A test item; identity is the id alone
#[derive(Debug, Clone)]
pub struct Pin {
    pub id: u32,
    pub position: LatLng,
    pub title: Option<String>,
}

impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Pin {}

impl Hash for Pin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Pin {
    pub fn new(id: u32, lat: f64, lng: f64) -> Self {
        Self {
            id,
            position: LatLng::new(lat, lng),
            title: None,
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

impl ClusterItem for Pin {
    fn position(&self) -> LatLng {
        self.position
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// `count` pins spread 0.001 degrees apart, starting at the given position
pub fn pins(first_id: u32, count: u32, lat: f64, lng: f64) -> Vec<Pin> {
    (0..count)
        .map(|i| Pin::new(first_id + i, lat + i as f64 * 0.001, lng + i as f64 * 0.001))
        .collect()
}

pub fn singletons(pins: &[Pin]) -> Vec<Cluster<Pin>> {
    pins.iter().cloned().map(Cluster::single).collect()
}

#[derive(Debug, Clone)]
struct MarkerState {
    position: LatLng,
    title: Option<String>,
    snippet: Option<String>,
    icon: MarkerIcon,
    visible: bool,
    info_window_shown: bool,
}

pub struct MockMarker {
    id: MarkerId,
    layer: MarkerLayer,
    state: Mutex<MarkerState>,
    removed: AtomicBool,
    recorder: Weak<Recorder>,
}

impl MockMarker {
    fn touch(&self) {
        if let Some(recorder) = self.recorder.upgrade() {
            recorder.record_thread();
        }
    }

    pub fn icon(&self) -> MarkerIcon {
        self.state.lock().unwrap().icon.clone()
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    pub fn open_info_window(&self) {
        self.state.lock().unwrap().info_window_shown = true;
    }
}

impl Marker for MockMarker {
    fn id(&self) -> MarkerId {
        self.id
    }

    fn position(&self) -> LatLng {
        self.state.lock().unwrap().position
    }

    fn set_position(&self, position: LatLng) {
        self.touch();
        self.state.lock().unwrap().position = position;
    }

    fn title(&self) -> Option<String> {
        self.state.lock().unwrap().title.clone()
    }

    fn set_title(&self, title: Option<String>) {
        self.touch();
        self.state.lock().unwrap().title = title;
    }

    fn snippet(&self) -> Option<String> {
        self.state.lock().unwrap().snippet.clone()
    }

    fn set_snippet(&self, snippet: Option<String>) {
        self.touch();
        self.state.lock().unwrap().snippet = snippet;
    }

    fn set_icon(&self, icon: MarkerIcon) {
        self.touch();
        self.state.lock().unwrap().icon = icon;
    }

    fn set_visible(&self, visible: bool) {
        self.touch();
        self.state.lock().unwrap().visible = visible;
    }

    fn is_info_window_shown(&self) -> bool {
        self.state.lock().unwrap().info_window_shown
    }

    fn remove(&self) {
        self.touch();
        let Some(recorder) = self.recorder.upgrade() else {
            return;
        };
        if self.removed.swap(true, Ordering::SeqCst) {
            recorder.double_removes.fetch_add(1, Ordering::SeqCst);
            return;
        }
        recorder.removed.fetch_add(1, Ordering::SeqCst);
        recorder.events.lock().unwrap().push(MapEvent::Removed(self.id));
        recorder.live.lock().unwrap().remove(&self.id);
    }
}

#[derive(Default)]
struct Recorder {
    next_id: AtomicU64,
    added: AtomicUsize,
    removed: AtomicUsize,
    double_removes: AtomicUsize,
    live: Mutex<FxHashMap<MarkerId, Arc<MockMarker>>>,
    threads: Mutex<FxHashSet<String>>,
    events: Mutex<Vec<MapEvent>>,
    added_at: Mutex<FxHashMap<MarkerId, LatLng>>,
}

/// Marker lifecycle events in the order the map saw them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    Added(MarkerId),
    Removed(MarkerId),
}

impl Recorder {
    fn record_thread(&self) {
        let name = thread::current().name().unwrap_or("<unnamed>").to_string();
        self.threads.lock().unwrap().insert(name);
    }
}

/// A map that keeps every live marker in memory
pub struct MockMap {
    recorder: Arc<Recorder>,
    zoom: Mutex<f64>,
    bounds: Mutex<Option<LatLngBounds>>,
    listeners: Mutex<FxHashMap<MarkerLayer, MarkerListener>>,
}

impl MockMap {
    pub fn new(zoom: f64) -> Arc<Self> {
        Arc::new(Self {
            recorder: Arc::new(Recorder::default()),
            zoom: Mutex::new(zoom),
            bounds: Mutex::new(Some(LatLngBounds::from_coords(-85.0, -180.0, 85.0, 180.0))),
            listeners: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn set_zoom(&self, zoom: f64) {
        *self.zoom.lock().unwrap() = zoom;
    }

    /// `None` makes the visible region unavailable
    pub fn set_bounds(&self, bounds: Option<LatLngBounds>) {
        *self.bounds.lock().unwrap() = bounds;
    }

    pub fn added(&self) -> usize {
        self.recorder.added.load(Ordering::SeqCst)
    }

    pub fn removed(&self) -> usize {
        self.recorder.removed.load(Ordering::SeqCst)
    }

    pub fn double_removes(&self) -> usize {
        self.recorder.double_removes.load(Ordering::SeqCst)
    }

    pub fn live(&self, layer: MarkerLayer) -> Vec<Arc<MockMarker>> {
        self.recorder
            .live
            .lock()
            .unwrap()
            .values()
            .filter(|marker| marker.layer == layer)
            .cloned()
            .collect()
    }

    pub fn live_positions(&self, layer: MarkerLayer) -> FxHashSet<LatLng> {
        self.live(layer).iter().map(|marker| marker.position()).collect()
    }

    pub fn live_count(&self) -> usize {
        self.recorder.live.lock().unwrap().len()
    }

    /// Names of the threads that mutated a marker
    pub fn mutating_threads(&self) -> FxHashSet<String> {
        self.recorder.threads.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<MapEvent> {
        self.recorder.events.lock().unwrap().clone()
    }

    /// Where `add_marker` placed the marker, before any animation moved it
    pub fn added_position(&self, id: MarkerId) -> Option<LatLng> {
        self.recorder.added_at.lock().unwrap().get(&id).copied()
    }

    pub fn has_listener(&self, layer: MarkerLayer) -> bool {
        self.listeners.lock().unwrap().contains_key(&layer)
    }

    /// Delivers `event` the way the host widget would
    pub fn fire(&self, layer: MarkerLayer, event: MarkerEvent, marker: &MarkerHandle) -> bool {
        let listener = self.listeners.lock().unwrap().get(&layer).cloned();
        listener.map_or(false, |listener| listener(event, marker))
    }
}

impl MapView for MockMap {
    fn add_marker(&self, layer: MarkerLayer, options: MarkerOptions) -> MarkerHandle {
        self.recorder.record_thread();
        let id = self.recorder.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let marker = Arc::new(MockMarker {
            id,
            layer,
            state: Mutex::new(MarkerState {
                position: options.position,
                title: options.title,
                snippet: options.snippet,
                icon: options.icon,
                visible: options.visible,
                info_window_shown: false,
            }),
            removed: AtomicBool::new(false),
            recorder: Arc::downgrade(&self.recorder),
        });
        self.recorder.added.fetch_add(1, Ordering::SeqCst);
        self.recorder.events.lock().unwrap().push(MapEvent::Added(id));
        self.recorder.added_at.lock().unwrap().insert(id, options.position);
        self.recorder.live.lock().unwrap().insert(id, Arc::clone(&marker));
        MarkerHandle::new(marker)
    }

    fn visible_bounds(&self) -> Result<LatLngBounds> {
        self.bounds
            .lock()
            .unwrap()
            .ok_or_else(|| Error::Projection("map is not laid out".into()))
    }

    fn zoom(&self) -> f64 {
        *self.zoom.lock().unwrap()
    }

    fn set_marker_listener(&self, layer: MarkerLayer, listener: Option<MarkerListener>) {
        let mut listeners = self.listeners.lock().unwrap();
        match listener {
            Some(listener) => listeners.insert(layer, listener),
            None => listeners.remove(&layer),
        };
    }
}

/// Fast animations so tests do not wait on frame timing
pub fn fast_options() -> RendererOptions {
    RendererOptions {
        animation_duration_ms: 40,
        frame_interval_ms: 5,
        rearm_interval_ms: 1,
        ..RendererOptions::default()
    }
}

/// A renderer over `map` that reports each committed cycle on the returned channel
pub fn renderer(
    map: &Arc<MockMap>,
    options: RendererOptions,
) -> (DefaultClusterRenderer<Pin>, Receiver<RenderSummary>) {
    renderer_on(map, options, None)
}

/// Like [`renderer`], mutating markers on `executor` when given
pub fn renderer_on(
    map: &Arc<MockMap>,
    options: RendererOptions,
    executor: Option<Arc<dyn UiExecutor>>,
) -> (DefaultClusterRenderer<Pin>, Receiver<RenderSummary>) {
    let clustering: Arc<dyn ClusteringStrategy<Pin>> =
        Arc::new(StaticClustering::with_max_distance(100.0));
    let mut builder =
        DefaultClusterRenderer::builder(Arc::clone(map) as Arc<dyn MapView>, clustering)
            .with_options(options);
    if let Some(executor) = executor {
        builder = builder.with_executor(executor);
    }
    let renderer = builder.build().unwrap();
    let (tx, rx): (Sender<RenderSummary>, Receiver<RenderSummary>) = unbounded();
    renderer.set_on_render_complete(Some(Arc::new(move |summary: &RenderSummary| {
        let _ = tx.send(summary.clone());
    })));
    (renderer, rx)
}
