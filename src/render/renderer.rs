//! The cluster renderer facade
//!
//! [`DefaultClusterRenderer`] accepts cluster sets from any thread, keeps at
//! most one of them pending (the newest), and runs one render cycle at a time
//! on its worker. Marker mutations happen on the looper.
//!
//! A cycle that panics (an item in two clusters, a failing hook) fails the
//! renderer for good: the pending request is dropped, the failure is kept
//! for [`DefaultClusterRenderer::failure`], and later requests panic.

use crate::background::looper::{Looper, UiExecutor};
use crate::background::panic_message;
use crate::background::worker::SerialWorker;
use crate::core::config::{RenderProfile, RendererOptions};
use crate::map::{MapView, MarkerEvent, MarkerHandle, MarkerLayer, MarkerListener};
use crate::render::hooks::{ClusterRendererHooks, DefaultHooks};
use crate::render::modifier::MarkerModifier;
use crate::render::task::{ProjectionSnapshot, RenderState, RenderSummary, RenderTask};
use crate::spatial::clustering::{Cluster, ClusterItem, ClusterSet, ClusteringStrategy};
use crate::Result;
use fxhash::FxHashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Receives a cluster marker event; returns `true` when it was consumed
pub type ClusterListener<T> = Arc<dyn Fn(&Cluster<T>) -> bool + Send + Sync>;

/// Receives an item marker event; returns `true` when it was consumed
pub type ClusterItemListener<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Called on the render worker after every cycle commits
pub type RenderCompleteListener = Arc<dyn Fn(&RenderSummary) + Send + Sync>;

fn lock<X>(mutex: &Mutex<X>) -> MutexGuard<'_, X> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Depth-1 request slot; a newer cluster set replaces a pending one
struct ViewModifier<T> {
    next: Option<ClusterSet<T>>,
    in_progress: bool,
    failure: Option<String>,
}

struct Listeners<T> {
    clusters: FxHashMap<MarkerEvent, ClusterListener<T>>,
    items: FxHashMap<MarkerEvent, ClusterItemListener<T>>,
    render_complete: Option<RenderCompleteListener>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            clusters: FxHashMap::default(),
            items: FxHashMap::default(),
            render_complete: None,
        }
    }
}

struct Shared<T: ClusterItem> {
    map: Arc<dyn MapView>,
    clustering: Arc<dyn ClusteringStrategy<T>>,
    hooks: Arc<dyn ClusterRendererHooks<T>>,
    modifier: Arc<MarkerModifier<T>>,
    options: Mutex<RendererOptions>,
    view: Mutex<ViewModifier<T>>,
    render_state: Mutex<RenderState<T>>,
    listeners: Mutex<Listeners<T>>,
    worker: SerialWorker,
    /// Present when the renderer spawned its own looper
    looper: Option<Arc<Looper>>,
}

impl<T: ClusterItem> Drop for Shared<T> {
    fn drop(&mut self) {
        self.worker.shutdown();
        if let Some(looper) = &self.looper {
            looper.shutdown();
        }
    }
}

impl<T: ClusterItem> Shared<T> {
    fn try_start(self: &Arc<Self>) {
        let clusters = {
            let mut view = lock(&self.view);
            if view.in_progress || view.failure.is_some() {
                return;
            }
            match view.next.take() {
                Some(clusters) => {
                    view.in_progress = true;
                    clusters
                }
                None => return,
            }
        };

        let task = RenderTask::new(
            clusters,
            ProjectionSnapshot::capture(self.map.as_ref()),
            lock(&self.options).clone(),
            self.clustering.max_distance_between_clustered_items(),
        );
        let this = Arc::clone(self);
        if let Err(e) = self.worker.execute(Box::new(move || this.run(task))) {
            log::warn!("dropping render request: {}", e);
            lock(&self.view).in_progress = false;
        }
    }

    fn run(self: &Arc<Self>, task: RenderTask<T>) {
        let outcome = {
            let mut state = lock(&self.render_state);
            panic::catch_unwind(AssertUnwindSafe(|| {
                task.run(&mut state, &self.modifier, self.hooks.as_ref())
            }))
        };
        let summary = match outcome {
            Ok(summary) => summary,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("render cycle failed; renderer stopped: {}", message);
                let mut view = lock(&self.view);
                view.next = None;
                view.in_progress = false;
                view.failure = Some(message);
                return;
            }
        };
        let on_complete = lock(&self.listeners).render_complete.clone();
        if let Some(on_complete) = on_complete {
            on_complete(&summary);
        }
        lock(&self.view).in_progress = false;
        self.try_start();
    }

    fn dispatch(&self, layer: MarkerLayer, event: MarkerEvent, marker: &MarkerHandle) -> bool {
        match layer {
            MarkerLayer::Items => {
                let listener = lock(&self.listeners).items.get(&event).cloned();
                match (listener, self.modifier.item_for_marker(marker)) {
                    (Some(listener), Some(item)) => listener(&item),
                    _ => false,
                }
            }
            MarkerLayer::Clusters => {
                let listener = lock(&self.listeners).clusters.get(&event).cloned();
                match (listener, self.modifier.cluster_for_marker(marker)) {
                    (Some(listener), Some(cluster)) => listener(&cluster),
                    _ => false,
                }
            }
        }
    }
}

/// Renders cluster sets as markers, diffing each set against the last one
pub struct DefaultClusterRenderer<T: ClusterItem> {
    shared: Arc<Shared<T>>,
}

impl<T: ClusterItem> DefaultClusterRenderer<T> {
    pub fn builder(
        map: Arc<dyn MapView>,
        clustering: Arc<dyn ClusteringStrategy<T>>,
    ) -> RendererBuilder<T> {
        RendererBuilder::new(map, clustering)
    }

    /// Requests a render of `clusters`. Replaces any request that has not
    /// started yet.
    ///
    /// # Panics
    ///
    /// When an earlier render cycle failed.
    pub fn on_clusters_changed(&self, clusters: impl IntoIterator<Item = Cluster<T>>) {
        let clusters: ClusterSet<T> = clusters.into_iter().collect();
        {
            let mut view = lock(&self.shared.view);
            if let Some(failure) = view.failure.clone() {
                drop(view);
                panic!("cluster renderer failed in an earlier cycle: {}", failure);
            }
            if view.next.replace(clusters).is_some() {
                log::trace!("superseding a pending render request");
            }
        }
        self.shared.try_start();
    }

    /// Asks the clustering strategy for the current zoom and renders the result
    pub fn recluster(&self) {
        let clusters = self.shared.clustering.clusters(self.shared.map.zoom());
        self.on_clusters_changed(clusters);
    }

    pub fn set_animation(&self, animate: bool) {
        lock(&self.shared.options).animate = animate;
    }

    pub fn set_animation_duration(&self, duration: Duration) {
        lock(&self.shared.options).animation_duration_ms =
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn set_min_cluster_size(&self, min_cluster_size: usize) {
        lock(&self.shared.options).min_cluster_size = min_cluster_size;
    }

    pub fn min_cluster_size(&self) -> usize {
        lock(&self.shared.options).min_cluster_size
    }

    pub fn options(&self) -> RendererOptions {
        lock(&self.shared.options).clone()
    }

    /// Starts forwarding marker events from both marker layers
    pub fn on_add(&self) {
        for layer in [MarkerLayer::Items, MarkerLayer::Clusters] {
            let shared: Weak<Shared<T>> = Arc::downgrade(&self.shared);
            let listener: MarkerListener = Arc::new(move |event: MarkerEvent, marker: &MarkerHandle| {
                shared
                    .upgrade()
                    .map_or(false, |shared| shared.dispatch(layer, event, marker))
            });
            self.shared.map.set_marker_listener(layer, Some(listener));
        }
    }

    pub fn on_remove(&self) {
        self.shared.map.set_marker_listener(MarkerLayer::Items, None);
        self.shared.map.set_marker_listener(MarkerLayer::Clusters, None);
    }

    fn set_cluster_listener(&self, event: MarkerEvent, listener: Option<ClusterListener<T>>) {
        let mut listeners = lock(&self.shared.listeners);
        match listener {
            Some(listener) => listeners.clusters.insert(event, listener),
            None => listeners.clusters.remove(&event),
        };
    }

    fn set_item_listener(&self, event: MarkerEvent, listener: Option<ClusterItemListener<T>>) {
        let mut listeners = lock(&self.shared.listeners);
        match listener {
            Some(listener) => listeners.items.insert(event, listener),
            None => listeners.items.remove(&event),
        };
    }

    pub fn set_on_cluster_click_listener(&self, listener: Option<ClusterListener<T>>) {
        self.set_cluster_listener(MarkerEvent::Click, listener);
    }

    pub fn set_on_cluster_info_window_click_listener(&self, listener: Option<ClusterListener<T>>) {
        self.set_cluster_listener(MarkerEvent::InfoWindowClick, listener);
    }

    pub fn set_on_cluster_info_window_long_click_listener(
        &self,
        listener: Option<ClusterListener<T>>,
    ) {
        self.set_cluster_listener(MarkerEvent::InfoWindowLongClick, listener);
    }

    pub fn set_on_cluster_item_click_listener(&self, listener: Option<ClusterItemListener<T>>) {
        self.set_item_listener(MarkerEvent::Click, listener);
    }

    pub fn set_on_cluster_item_info_window_click_listener(
        &self,
        listener: Option<ClusterItemListener<T>>,
    ) {
        self.set_item_listener(MarkerEvent::InfoWindowClick, listener);
    }

    pub fn set_on_cluster_item_info_window_long_click_listener(
        &self,
        listener: Option<ClusterItemListener<T>>,
    ) {
        self.set_item_listener(MarkerEvent::InfoWindowLongClick, listener);
    }

    pub fn set_on_render_complete(&self, listener: Option<RenderCompleteListener>) {
        lock(&self.shared.listeners).render_complete = listener;
    }

    pub fn marker_for_item(&self, item: &T) -> Option<MarkerHandle> {
        self.shared.modifier.marker_for_item(item)
    }

    pub fn item_for_marker(&self, marker: &MarkerHandle) -> Option<T> {
        self.shared.modifier.item_for_marker(marker)
    }

    pub fn marker_for_cluster(&self, cluster: &Cluster<T>) -> Option<MarkerHandle> {
        self.shared.modifier.marker_for_cluster(cluster)
    }

    pub fn cluster_for_marker(&self, marker: &MarkerHandle) -> Option<Cluster<T>> {
        self.shared.modifier.cluster_for_marker(marker)
    }

    /// Whether a render is running or waiting to run
    pub fn is_rendering(&self) -> bool {
        let view = lock(&self.shared.view);
        view.in_progress || view.next.is_some()
    }

    /// Why the renderer stopped, if a render cycle failed
    pub fn failure(&self) -> Option<String> {
        lock(&self.shared.view).failure.clone()
    }

    /// Stops the render worker after the cycle in flight, if any, commits.
    /// Pending requests are dropped. Must not be called on the looper while a
    /// render is running.
    pub fn shutdown(&self) {
        lock(&self.shared.view).next = None;
        self.shared.worker.shutdown();
    }
}

/// Builder for [`DefaultClusterRenderer`]
pub struct RendererBuilder<T: ClusterItem> {
    map: Arc<dyn MapView>,
    clustering: Arc<dyn ClusteringStrategy<T>>,
    options: RendererOptions,
    hooks: Option<Arc<dyn ClusterRendererHooks<T>>>,
    executor: Option<Arc<dyn UiExecutor>>,
}

impl<T: ClusterItem> RendererBuilder<T> {
    pub fn new(map: Arc<dyn MapView>, clustering: Arc<dyn ClusteringStrategy<T>>) -> Self {
        Self {
            map,
            clustering,
            options: RendererOptions::default(),
            hooks: None,
            executor: None,
        }
    }

    pub fn with_profile(mut self, profile: RenderProfile) -> Self {
        self.options = profile.resolve();
        self
    }

    pub fn with_options(mut self, options: RendererOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ClusterRendererHooks<T>>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Runs marker mutations on the host's UI thread instead of a private looper
    pub fn with_executor(mut self, executor: Arc<dyn UiExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> Result<DefaultClusterRenderer<T>> {
        self.options.validate()?;

        let (executor, looper) = match self.executor {
            Some(executor) => (executor, None),
            None => {
                let looper = Arc::new(Looper::spawn("markercluster-looper")?);
                (Arc::clone(&looper) as Arc<dyn UiExecutor>, Some(looper))
            }
        };
        let hooks = self
            .hooks
            .unwrap_or_else(|| Arc::new(DefaultHooks::new()) as Arc<dyn ClusterRendererHooks<T>>);
        let modifier = MarkerModifier::new(
            Arc::clone(&self.map),
            executor,
            Arc::clone(&hooks),
            self.options.clone(),
        );
        let worker = SerialWorker::spawn("markercluster-render")?;

        log::debug!(
            "cluster renderer ready (animate: {}, min cluster size: {})",
            self.options.animate,
            self.options.min_cluster_size
        );

        Ok(DefaultClusterRenderer {
            shared: Arc::new(Shared {
                map: self.map,
                clustering: self.clustering,
                hooks,
                modifier,
                options: Mutex::new(self.options),
                view: Mutex::new(ViewModifier {
                    next: None,
                    in_progress: false,
                    failure: None,
                }),
                render_state: Mutex::new(RenderState::default()),
                listeners: Mutex::new(Listeners::default()),
                worker,
                looper,
            }),
        })
    }
}
