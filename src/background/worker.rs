//! Single background thread for render cycles
//!
//! Jobs run one at a time in submission order, so two render cycles never
//! overlap.

use crate::background::looper::Job;
use crate::{Error, Result};
use crossbeam_channel::{unbounded, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

enum WorkerMessage {
    Run(Job),
    Shutdown,
}

pub struct SerialWorker {
    name: String,
    tx: Sender<WorkerMessage>,
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_signal: AtomicBool,
}

impl SerialWorker {
    pub fn spawn(name: &str) -> Result<Self> {
        let (tx, rx) = unbounded::<WorkerMessage>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(message) = rx.recv() {
                    match message {
                        WorkerMessage::Run(job) => job(),
                        WorkerMessage::Shutdown => break,
                    }
                }
            })
            .map_err(|e| Error::Worker(format!("failed to spawn worker '{}': {}", name, e)))?;
        log::debug!("worker '{}' started", name);

        Ok(Self {
            name: name.to_string(),
            tx,
            handle: Mutex::new(Some(handle)),
            shutdown_signal: AtomicBool::new(false),
        })
    }

    pub fn execute(&self, job: Job) -> Result<()> {
        if self.is_shutting_down() {
            return Err(Error::Worker(format!("worker '{}' is shut down", self.name)));
        }
        self.tx
            .send(WorkerMessage::Run(job))
            .map_err(|_| Error::Worker(format!("worker '{}' has exited", self.name)))
    }

    /// Lets the running job finish, drops queued ones and joins the thread
    pub fn shutdown(&self) {
        if self.shutdown_signal.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.tx.send(WorkerMessage::Shutdown);
        let handle = self.handle.lock().ok().and_then(|mut handle| handle.take());
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        log::debug!("worker '{}' shut down", self.name);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_signal.load(Ordering::SeqCst)
    }
}

impl Drop for SerialWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
