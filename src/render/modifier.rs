//! Marker mutation scheduler
//!
//! Render cycles enqueue work from the render worker; the work is performed
//! on the looper in bounded passes. Five queues are serviced strictly in
//! this order:
//!
//! 1. high-priority (on-screen) removals
//! 2. animations waiting to start
//! 3. high-priority creations
//! 4. low-priority creations
//! 5. low-priority removals
//!
//! One mutex guards the queues, the busy counters, both marker caches and
//! the generation being built. Its condition variable is the only thing a
//! caller of [`MarkerModifier::drain`] ever blocks on.
//!
//! A panic while mutating a marker (a failing hook, or the same marker
//! rendered twice in one cycle) is caught on the looper. The scheduler drops
//! its queued work, records the failure and wakes every drain, which then
//! panics on the draining thread. A failed scheduler stays failed.

use crate::animation::{AnimationTask, Animator};
use crate::background::looper::UiExecutor;
use crate::background::panic_message;
use crate::core::config::RendererOptions;
use crate::core::geo::LatLng;
use crate::map::{MapView, MarkerHandle, MarkerLayer, MarkerOptions};
use crate::render::cache::MarkerCache;
use crate::render::hooks::ClusterRendererHooks;
use crate::render::marker::MarkerWithPosition;
use crate::render::task::CreateMarkerTask;
use crate::spatial::clustering::{Cluster, ClusterItem};
use fxhash::FxHashSet;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Counters for the cycle in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub created: usize,
    pub reused: usize,
    pub animated_in: usize,
    pub animated_out: usize,
    /// Markers moved without being created or removed
    pub moved: usize,
    pub removed: usize,
}

enum Work<T> {
    Remove(MarkerHandle),
    Animate(AnimationTask),
    Create(CreateMarkerTask<T>),
}

struct ModifierState<T> {
    on_screen_removals: VecDeque<MarkerHandle>,
    animations: VecDeque<AnimationTask>,
    on_screen_creates: VecDeque<CreateMarkerTask<T>>,
    creates: VecDeque<CreateMarkerTask<T>>,
    removals: VecDeque<MarkerHandle>,
    /// Work popped from a queue and not yet finished
    executing: usize,
    running_animations: usize,
    pass_armed: bool,
    item_cache: MarkerCache<T>,
    cluster_cache: MarkerCache<Cluster<T>>,
    generation: FxHashSet<MarkerWithPosition>,
    stats: CycleStats,
    options: RendererOptions,
    failure: Option<String>,
}

impl<T: ClusterItem> ModifierState<T> {
    fn new(options: RendererOptions) -> Self {
        Self {
            on_screen_removals: VecDeque::new(),
            animations: VecDeque::new(),
            on_screen_creates: VecDeque::new(),
            creates: VecDeque::new(),
            removals: VecDeque::new(),
            executing: 0,
            running_animations: 0,
            pass_armed: false,
            item_cache: MarkerCache::new(),
            cluster_cache: MarkerCache::new(),
            generation: FxHashSet::default(),
            stats: CycleStats::default(),
            options,
            failure: None,
        }
    }

    fn next_work(&mut self) -> Option<Work<T>> {
        if let Some(marker) = self.on_screen_removals.pop_front() {
            return Some(Work::Remove(marker));
        }
        if let Some(animation) = self.animations.pop_front() {
            return Some(Work::Animate(animation));
        }
        if let Some(task) = self.on_screen_creates.pop_front() {
            return Some(Work::Create(task));
        }
        if let Some(task) = self.creates.pop_front() {
            return Some(Work::Create(task));
        }
        self.removals.pop_front().map(Work::Remove)
    }

    fn has_queued(&self) -> bool {
        !(self.on_screen_removals.is_empty()
            && self.animations.is_empty()
            && self.on_screen_creates.is_empty()
            && self.creates.is_empty()
            && self.removals.is_empty())
    }

    fn is_busy(&self) -> bool {
        self.has_queued() || self.executing > 0 || self.running_animations > 0
    }

    /// Adds `marker` to the generation; `false` if it was already there
    fn track(&mut self, marker: MarkerWithPosition) -> bool {
        self.generation.insert(marker)
    }

    fn clear_queues(&mut self) {
        self.on_screen_removals.clear();
        self.animations.clear();
        self.on_screen_creates.clear();
        self.creates.clear();
        self.removals.clear();
    }

    fn purge(&mut self, marker: &MarkerHandle) {
        self.item_cache.remove(marker);
        self.cluster_cache.remove(marker);
    }
}

pub struct MarkerModifier<T: ClusterItem> {
    state: Mutex<ModifierState<T>>,
    idle: Condvar,
    map: Arc<dyn MapView>,
    executor: Arc<dyn UiExecutor>,
    hooks: Arc<dyn ClusterRendererHooks<T>>,
}

impl<T: ClusterItem> MarkerModifier<T> {
    pub fn new(
        map: Arc<dyn MapView>,
        executor: Arc<dyn UiExecutor>,
        hooks: Arc<dyn ClusterRendererHooks<T>>,
        options: RendererOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ModifierState::new(options)),
            idle: Condvar::new(),
            map,
            executor,
            hooks,
        })
    }

    fn lock(&self) -> MutexGuard<'_, ModifierState<T>> {
        match self.state.lock() {
            Ok(guard) => guard,
            // A panic mid-mutation leaves caches and screen out of step
            Err(_) => panic!("marker scheduler state poisoned by a panic on another thread"),
        }
    }

    /// Resets the per-cycle generation and counters and applies `options`
    pub fn begin_cycle(&self, options: &RendererOptions) {
        let mut state = self.lock();
        state.generation.clear();
        state.stats = CycleStats::default();
        state.options = options.clone();
    }

    /// Markers created or reused since the cycle began
    pub fn take_generation(&self) -> FxHashSet<MarkerWithPosition> {
        std::mem::take(&mut self.lock().generation)
    }

    pub fn take_stats(&self) -> CycleStats {
        std::mem::take(&mut self.lock().stats)
    }

    pub fn enqueue_create(self: &Arc<Self>, priority: bool, task: CreateMarkerTask<T>) {
        let mut state = self.lock();
        if priority {
            state.on_screen_creates.push_back(task);
        } else {
            state.creates.push_back(task);
        }
        self.arm_pass(&mut state, Duration::ZERO);
    }

    pub fn enqueue_remove(self: &Arc<Self>, priority: bool, marker: MarkerHandle) {
        let mut state = self.lock();
        if priority {
            state.on_screen_removals.push_back(marker);
        } else {
            state.removals.push_back(marker);
        }
        self.arm_pass(&mut state, Duration::ZERO);
    }

    /// Moves `marker` from `from` to `to`; it stays cached and on screen
    pub fn enqueue_animate(self: &Arc<Self>, marker: MarkerWithPosition, from: LatLng, to: LatLng) {
        let mut state = self.lock();
        state.animations.push_back(AnimationTask::new(marker, from, to));
        state.stats.moved += 1;
        self.arm_pass(&mut state, Duration::ZERO);
    }

    pub fn enqueue_animate_then_remove(
        self: &Arc<Self>,
        marker: MarkerWithPosition,
        from: LatLng,
        to: LatLng,
    ) {
        let mut state = self.lock();
        state
            .animations
            .push_back(AnimationTask::new(marker, from, to).then_remove());
        state.stats.animated_out += 1;
        self.arm_pass(&mut state, Duration::ZERO);
    }

    /// Blocks until every queued task has run and every animation has ended.
    ///
    /// # Panics
    ///
    /// When called on the looper thread, which is the thread that would have
    /// to do the work, and when a marker mutation panicked.
    pub fn drain(self: &Arc<Self>) {
        assert!(
            !self.executor.is_current_thread(),
            "MarkerModifier::drain called on the looper thread; this would deadlock"
        );
        let mut state = self.lock();
        loop {
            if let Some(failure) = state.failure.clone() {
                drop(state);
                panic!("marker mutation failed on the looper: {}", failure);
            }
            if !state.is_busy() {
                break;
            }
            if state.has_queued() {
                self.arm_pass(&mut state, Duration::ZERO);
            }
            state = match self.idle.wait(state) {
                Ok(guard) => guard,
                Err(_) => panic!("marker scheduler state poisoned while draining"),
            };
        }
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    /// Message of the marker mutation that panicked, if one did
    pub fn failure(&self) -> Option<String> {
        self.lock().failure.clone()
    }

    fn fail(&self, payload: Box<dyn Any + Send>) {
        let message = panic_message(payload.as_ref());
        log::error!("marker mutation panicked: {}", message);
        let mut state = self.lock();
        state.clear_queues();
        state.failure.get_or_insert(message);
        self.idle.notify_all();
    }

    fn arm_pass(self: &Arc<Self>, state: &mut ModifierState<T>, delay: Duration) {
        if state.pass_armed || state.failure.is_some() {
            return;
        }
        state.pass_armed = true;
        let this = Arc::clone(self);
        let pass = Box::new(move || this.run_pass());
        if delay.is_zero() {
            self.executor.post(pass);
        } else {
            self.executor.post_delayed(delay, pass);
        }
    }

    /// One bounded scheduling pass; runs on the looper
    fn run_pass(self: &Arc<Self>) {
        let max_tasks = {
            let mut state = self.lock();
            state.pass_armed = false;
            state.options.max_tasks_per_pass.max(1)
        };

        for _ in 0..max_tasks {
            let work = {
                let mut state = self.lock();
                match state.next_work() {
                    Some(work) => {
                        state.executing += 1;
                        work
                    }
                    None => break,
                }
            };
            let performed = panic::catch_unwind(AssertUnwindSafe(|| self.perform(work)));
            self.lock().executing -= 1;
            if let Err(payload) = performed {
                self.fail(payload);
                return;
            }
        }

        let mut state = self.lock();
        if state.has_queued() {
            let rearm = state.options.rearm_interval();
            self.arm_pass(&mut state, rearm);
        } else if !state.is_busy() {
            self.idle.notify_all();
        }
    }

    fn perform(self: &Arc<Self>, work: Work<T>) {
        match work {
            Work::Remove(marker) => self.remove_marker(&marker),
            Work::Animate(animation) => self.start_animation(animation),
            Work::Create(task) if task.render_as_cluster => self.create_cluster_marker(task),
            Work::Create(task) => self.create_item_markers(task),
        }
    }

    fn create_item_markers(&self, task: CreateMarkerTask<T>) {
        for item in task.cluster.items() {
            let cached = self.lock().item_cache.get(item).cloned();
            let marker = match cached {
                Some(marker) => {
                    self.hooks.on_cluster_item_updated(item, &marker);
                    self.lock().stats.reused += 1;
                    MarkerWithPosition::from_marker(marker)
                }
                None => {
                    let position = task.animate_from.unwrap_or_else(|| item.position());
                    let mut options = MarkerOptions::new(position);
                    self.hooks.on_before_cluster_item_rendered(item, &mut options);
                    let marker = self.map.add_marker(MarkerLayer::Items, options);
                    let tracked = MarkerWithPosition::new(marker.clone(), position);

                    let mut state = self.lock();
                    state.item_cache.put(item.clone(), marker);
                    state.stats.created += 1;
                    if let Some(from) = task.animate_from {
                        state
                            .animations
                            .push_back(AnimationTask::new(tracked.clone(), from, item.position()));
                        state.stats.animated_in += 1;
                    }
                    tracked
                }
            };
            self.hooks.on_cluster_item_rendered(item, marker.marker());
            let id = marker.marker().id();
            let fresh = self.lock().track(marker);
            assert!(
                fresh,
                "marker {} rendered twice in one cycle; is an item in two clusters?",
                id
            );
        }
    }

    fn create_cluster_marker(&self, task: CreateMarkerTask<T>) {
        let cluster = &task.cluster;
        let cached = self.lock().cluster_cache.get(cluster).cloned();
        let marker = match cached {
            Some(marker) => {
                self.hooks.on_cluster_updated(cluster, &marker);
                self.lock().stats.reused += 1;
                MarkerWithPosition::from_marker(marker)
            }
            None => {
                let position = task.animate_from.unwrap_or_else(|| cluster.position());
                let mut options = MarkerOptions::new(position);
                self.hooks.on_before_cluster_rendered(cluster, &mut options);
                let marker = self.map.add_marker(MarkerLayer::Clusters, options);
                let tracked = MarkerWithPosition::new(marker.clone(), position);

                let mut state = self.lock();
                state.cluster_cache.put(cluster.clone(), marker);
                state.stats.created += 1;
                if let Some(from) = task.animate_from {
                    state
                        .animations
                        .push_back(AnimationTask::new(tracked.clone(), from, cluster.position()));
                    state.stats.animated_in += 1;
                }
                tracked
            }
        };
        self.hooks.on_cluster_rendered(cluster, marker.marker());
        let id = marker.marker().id();
        let fresh = self.lock().track(marker);
        assert!(fresh, "cluster marker {} rendered twice in one cycle", id);
    }

    fn remove_marker(&self, marker: &MarkerHandle) {
        {
            let mut state = self.lock();
            state.purge(marker);
            state.stats.removed += 1;
        }
        log::trace!("removing marker {}", marker.id());
        marker.remove();
    }

    fn start_animation(self: &Arc<Self>, animation: AnimationTask) {
        let (duration, frame_interval, easing) = {
            let mut state = self.lock();
            state.running_animations += 1;
            (
                state.options.animation_duration(),
                state.options.frame_interval(),
                state.options.easing,
            )
        };
        let animator = Animator::start(animation, duration, easing);
        self.step_animation(animator, frame_interval);
    }

    fn step_animation(self: &Arc<Self>, animator: Animator, frame_interval: Duration) {
        let stepped = panic::catch_unwind(AssertUnwindSafe(|| {
            if animator.step() {
                self.finish_animation(animator.into_task());
                None
            } else {
                Some(animator)
            }
        }));
        match stepped {
            Ok(Some(animator)) => {
                let this = Arc::clone(self);
                self.executor.post_delayed(
                    frame_interval,
                    Box::new(move || this.step_animation(animator, frame_interval)),
                );
            }
            Ok(None) => {}
            // finish_animation releases its slot last, so it was never released
            Err(payload) => {
                self.lock().running_animations -= 1;
                self.fail(payload);
            }
        }
    }

    fn finish_animation(&self, animation: AnimationTask) {
        if animation.remove_on_complete {
            self.remove_marker(animation.marker.marker());
        }
        animation.marker.set_position(animation.to);

        let mut state = self.lock();
        state.running_animations -= 1;
        if !state.is_busy() {
            self.idle.notify_all();
        }
    }

    pub fn marker_for_item(&self, item: &T) -> Option<MarkerHandle> {
        self.lock().item_cache.get(item).cloned()
    }

    pub fn item_for_marker(&self, marker: &MarkerHandle) -> Option<T> {
        self.lock().item_cache.get_key(marker).cloned()
    }

    pub fn marker_for_cluster(&self, cluster: &Cluster<T>) -> Option<MarkerHandle> {
        self.lock().cluster_cache.get(cluster).cloned()
    }

    pub fn cluster_for_marker(&self, marker: &MarkerHandle) -> Option<Cluster<T>> {
        self.lock().cluster_cache.get_key(marker).cloned()
    }

    /// Number of cached (item markers, cluster markers)
    pub fn cached_markers(&self) -> (usize, usize) {
        let state = self.lock();
        (state.item_cache.len(), state.cluster_cache.len())
    }
}
