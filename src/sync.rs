// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2020-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Worker that runs a task once per period in a background thread until
/// it is stopped.
///
/// The `.run()` method of the worker runs in its own thread (thread B)
/// while `.stop()` and `.stop_and_wait()` are meant to be called from
/// the thread that owns the worker (thread A).
///
/// If the task panics, the thread running it is replaced by a new one
/// that picks up where it left off and the panic is counted. Stopping the
/// worker is done by sending a message on a channel that the run loop
/// selects on alongside its ticker, so stopping never waits for the next
/// tick.
pub(crate) struct Worker {
    name: String,
    period: Duration,
    task: Box<dyn Fn() + Send + Sync + 'static>,
    sender: Sender<()>,
    receiver: Receiver<()>,
    stopped: AtomicBool,
    panics: AtomicU64,
}

impl Worker {
    /// Create a worker running `task` every `period` and start it in a new
    /// thread named `name`.
    pub(crate) fn spawn<F>(name: String, period: Duration, task: F) -> io::Result<Arc<Worker>>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (tx, rx) = bounded(1);
        let worker = Arc::new(Worker {
            name,
            period,
            task: Box::new(task),
            sender: tx,
            receiver: rx,
            stopped: AtomicBool::new(false),
            panics: AtomicU64::new(0),
        });

        spawn_worker_in_thread(Arc::clone(&worker))?;
        Ok(worker)
    }

    fn run(&self) {
        let ticker = tick(self.period);

        loop {
            select! {
                recv(ticker) -> _ => (self.task)(),
                recv(self.receiver) -> _ => break,
            }
        }

        self.stopped.store(true, Ordering::Release);
    }

    /// Signal the run loop to stop without waiting for it to do so.
    pub(crate) fn stop(&self) {
        let _ = self.sender.try_send(());
    }

    /// Signal the run loop to stop and block until it has.
    pub(crate) fn stop_and_wait(&self) {
        self.stop();

        while !self.is_stopped() {
            thread::yield_now();
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Number of times the task panicked and its thread was restarted.
    pub(crate) fn panics(&self) -> u64 {
        self.panics.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("stopped", &self.is_stopped())
            .field("panics", &self.panics())
            .finish()
    }
}

/// Create a thread and run the worker in it to completion
///
/// This function uses a `Sentinel` struct to make sure that any panics from
/// running the worker result in another thread being spawned to start running
/// the worker again.
fn spawn_worker_in_thread(worker: Arc<Worker>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name(worker.name.clone()).spawn(move || {
        let mut sentinel = Sentinel::new(&worker);
        worker.run();
        sentinel.cancel();
    })
}

/// Struct for ensuring a worker runs to completion correctly, without
/// panicking.
///
/// The sentinel will spawn a new thread to continue running the worker
/// in its destructor unless the `.cancel()` method is called after the
/// worker completes (which won't happen if the worker panics).
#[derive(Debug)]
struct Sentinel<'a> {
    worker: &'a Arc<Worker>,
    active: bool,
}

impl<'a> Sentinel<'a> {
    fn new(worker: &'a Arc<Worker>) -> Sentinel<'a> {
        Sentinel { worker, active: true }
    }

    fn cancel(&mut self) {
        self.active = false;
    }
}

impl<'a> Drop for Sentinel<'a> {
    fn drop(&mut self) {
        if self.active {
            self.worker.panics.fetch_add(1, Ordering::Release);
            warn!(worker = %self.worker.name, "Flush worker panicked, restarting.");

            if let Err(e) = spawn_worker_in_thread(Arc::clone(self.worker)) {
                // Nothing left to run the loop, don't leave anyone waiting on it.
                warn!(worker = %self.worker.name, error = %e, "Failed to restart flush worker.");
                self.worker.stopped.store(true, Ordering::Release);
            }
        }
    }
}
