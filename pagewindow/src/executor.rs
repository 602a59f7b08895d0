use std::sync::{Arc, mpsc};
use std::thread;

use parking_lot::Mutex;

/// A unit of work submitted to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context: where the pager runs loads ("work") or delivers notifications
/// ("events").
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Runs every job immediately on the submitting thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct Inline;

impl Executor for Inline {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Spawns a named OS thread per job.
///
/// If the OS refuses a new thread the job runs inline instead.
#[derive(Clone, Debug)]
pub struct ThreadPerTask {
    name: String,
}

impl ThreadPerTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadPerTask {
    fn default() -> Self {
        Self::new("pagewindow-work")
    }
}

impl Executor for ThreadPerTask {
    fn execute(&self, job: Job) {
        // `spawn` consumes the closure even on failure, so the job is parked in a shared slot
        // that the fallback path can still take.
        let slot = Arc::new(Mutex::new(Some(job)));
        let worker_slot = Arc::clone(&slot);
        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                if let Some(job) = worker_slot.lock().take() {
                    job();
                }
            });
        if let Err(_err) = spawned {
            pwarn!(error = %_err, "ThreadPerTask: spawn failed, running inline");
            if let Some(job) = slot.lock().take() {
                job();
            }
        }
    }
}

/// A single dedicated thread draining jobs in submission order.
///
/// The thread exits once the queue is dropped and every queued job has run.
#[derive(Debug)]
pub struct SerialQueue {
    tx: Mutex<Option<mpsc::Sender<Job>>>,
}

impl SerialQueue {
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let spawned = thread::Builder::new().name(name.into()).spawn(move || {
            while let Ok(job) = rx.recv() {
                job();
            }
        });
        let tx = match spawned {
            Ok(_) => Some(tx),
            Err(_err) => {
                pwarn!(error = %_err, "SerialQueue: spawn failed, jobs will run inline");
                None
            }
        };
        Self { tx: Mutex::new(tx) }
    }
}

impl Default for SerialQueue {
    fn default() -> Self {
        Self::new("pagewindow-events")
    }
}

impl Executor for SerialQueue {
    fn execute(&self, job: Job) {
        let rejected = match self.tx.lock().as_ref() {
            Some(tx) => tx.send(job).err().map(|err| err.0),
            None => Some(job),
        };
        if let Some(job) = rejected {
            job();
        }
    }
}
