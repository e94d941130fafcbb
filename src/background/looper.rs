//! UI-affinity execution context
//!
//! All marker mutations, animation frames and click callbacks run on one
//! thread. [`UiExecutor`] abstracts that thread; [`Looper`] is a dedicated
//! thread implementation with delayed posts for re-arming and frame timing.

use crate::{Error, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// A unit of work for an execution context
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The single thread that owns marker mutation
pub trait UiExecutor: Send + Sync {
    /// Runs `job` on the UI thread after all previously posted jobs
    fn post(&self, job: Job);

    /// Runs `job` on the UI thread no sooner than `delay` from now
    fn post_delayed(&self, delay: Duration, job: Job);

    /// Whether the calling thread is the UI thread
    fn is_current_thread(&self) -> bool;
}

enum LooperMessage {
    Run(Job),
    RunAt(Instant, Job),
    Shutdown,
}

struct DelayedJob {
    deadline: Instant,
    sequence: u64,
    job: Job,
}

impl PartialEq for DelayedJob {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for DelayedJob {}

impl PartialOrd for DelayedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earlier deadline first, then earlier submission
        self.deadline
            .cmp(&other.deadline)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// A dedicated thread running posted jobs in order
pub struct Looper {
    tx: Sender<LooperMessage>,
    thread_id: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Looper {
    pub fn spawn(name: &str) -> Result<Self> {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Self::run_loop(rx))
            .map_err(|e| Error::Worker(format!("failed to spawn looper '{}': {}", name, e)))?;
        log::debug!("looper '{}' started", name);

        Ok(Self {
            tx,
            thread_id: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stops the looper after the jobs already due have run
    pub fn shutdown(&self) {
        let _ = self.tx.send(LooperMessage::Shutdown);
        let handle = self.handle.lock().ok().and_then(|mut handle| handle.take());
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    fn run_loop(rx: Receiver<LooperMessage>) {
        let mut delayed: BinaryHeap<Reverse<DelayedJob>> = BinaryHeap::new();
        let mut sequence = 0u64;

        loop {
            // Run everything that has come due
            let now = Instant::now();
            while delayed
                .peek()
                .map(|Reverse(next)| next.deadline <= now)
                .unwrap_or(false)
            {
                if let Some(Reverse(due)) = delayed.pop() {
                    (due.job)();
                }
            }

            let message = match delayed.peek() {
                Some(Reverse(next)) => {
                    let timeout = next.deadline.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(timeout) {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match rx.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };

            match message {
                LooperMessage::Run(job) => job(),
                LooperMessage::RunAt(deadline, job) => {
                    sequence += 1;
                    delayed.push(Reverse(DelayedJob {
                        deadline,
                        sequence,
                        job,
                    }));
                }
                LooperMessage::Shutdown => break,
            }
        }
        log::debug!("looper exiting with {} delayed jobs dropped", delayed.len());
    }
}

impl UiExecutor for Looper {
    fn post(&self, job: Job) {
        if self.tx.send(LooperMessage::Run(job)).is_err() {
            log::warn!("looper is shut down; dropping posted job");
        }
    }

    fn post_delayed(&self, delay: Duration, job: Job) {
        let deadline = Instant::now() + delay;
        if self.tx.send(LooperMessage::RunAt(deadline, job)).is_err() {
            log::warn!("looper is shut down; dropping delayed job");
        }
    }

    fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl Drop for Looper {
    fn drop(&mut self) {
        self.shutdown();
    }
}
