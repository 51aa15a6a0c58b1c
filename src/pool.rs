//! Fixed-size worker pool draining a shared FIFO queue.
//!
//! Workers are plain OS threads fed through an unbounded crossbeam channel.
//! Dropping the sending half is the shutdown signal: workers keep pulling until
//! the queue is empty and only then observe the disconnect and exit.

use crate::error::{Result, SortDirError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{error, trace, warn};

pub const DEFAULT_WORKERS: usize = 4;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `worker_count` long-lived workers.
    pub fn new(worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(SortDirError::InvalidParameter(
                "worker count must be at least 1".to_string(),
            ));
        }

        let (sender, receiver) = unbounded::<Job>();
        let mut pool = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(worker_count),
        };

        for id in 0..worker_count {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("sortdir-worker-{id}"))
                .spawn(move || worker_loop(id, receiver));

            match handle {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    // joins whatever already started
                    pool.shutdown();
                    return Err(SortDirError::Io(e));
                }
            }
        }

        Ok(pool)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job without waiting for it to run.
    ///
    /// Fails with [`SortDirError::PoolShutDown`] once [`shutdown`](Self::shutdown)
    /// has been called.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(SortDirError::PoolShutDown)?;
        sender
            .send(Box::new(job))
            .map_err(|_| SortDirError::PoolShutDown)
    }

    /// Stops accepting jobs, runs everything already queued, and joins every worker.
    ///
    /// Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        drop(self.sender.take());

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread exited abnormally");
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender.is_none()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(id: usize, receiver: Receiver<Job>) {
    trace!(worker = id, "worker started");

    // recv keeps yielding queued jobs after the sender is gone
    while let Ok(job) = receiver.recv() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!(
                worker = id,
                panic = %panic_message(payload.as_ref()),
                "job panicked; worker continues"
            );
        }
    }

    trace!(worker = id, "worker stopped");
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
