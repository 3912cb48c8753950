//! Single-threaded background worker for store mutations.
//!
//! Jobs run one at a time in submission order, off the caller's thread.
//! This is the single writer the controller funnels inserts, updates and
//! deletes through.

use crate::logging::panic_payload_summary;
use log::error;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send>;

/// Returned when a job is submitted after shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerClosed;

impl Display for WorkerClosed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "background worker is shut down")
    }
}

impl Error for WorkerClosed {}

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Job>,
    running: bool,
    shutdown: bool,
}

#[derive(Default)]
struct WorkerInner {
    queue: Mutex<Queue>,
    work_ready: Condvar,
    idle: Condvar,
}

/// FIFO job runner backed by one named thread.
pub struct BackgroundWorker {
    inner: Arc<WorkerInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundWorker {
    /// Spawns the worker thread.
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let inner = Arc::new(WorkerInner::default());
        let worker_inner = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || worker_loop(&worker_inner))?;

        Ok(Self {
            inner,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Queues `job` behind every previously submitted job.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Result<(), WorkerClosed> {
        {
            let mut queue = self.inner.queue.lock();
            if queue.shutdown {
                return Err(WorkerClosed);
            }
            queue.jobs.push_back(Box::new(job));
        }
        self.inner.work_ready.notify_one();
        Ok(())
    }

    /// Blocks until every queued and running job has finished.
    ///
    /// Must not be called from inside a job.
    pub fn drain(&self) {
        let mut queue = self.inner.queue.lock();
        while !queue.jobs.is_empty() || queue.running {
            self.inner.idle.wait(&mut queue);
        }
    }

    /// Rejects new jobs, lets queued ones finish, then joins the thread.
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            let mut queue = self.inner.queue.lock();
            queue.shutdown = true;
            self.inner.work_ready.notify_all();
        }

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == std::thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("event=worker_join module=controller status=error error_code=worker_panicked");
            }
        }
    }
}

impl Drop for BackgroundWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(inner: &WorkerInner) {
    loop {
        let job = {
            let mut queue = inner.queue.lock();
            loop {
                if let Some(job) = queue.jobs.pop_front() {
                    queue.running = true;
                    break job;
                }
                if queue.shutdown {
                    return;
                }
                inner.work_ready.wait(&mut queue);
            }
        };

        // A panicking job must not take the worker down with it.
        if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)) {
            error!(
                "event=worker_job module=controller status=error error_code=job_panicked payload={}",
                panic_payload_summary(payload.as_ref())
            );
        }

        let mut queue = inner.queue.lock();
        queue.running = false;
        if queue.jobs.is_empty() {
            inner.idle.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BackgroundWorker, WorkerClosed};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn jobs_run_in_submission_order() {
        let worker = BackgroundWorker::spawn("roster-test-order").unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..20 {
            let order = Arc::clone(&order);
            worker.submit(move || order.lock().push(i)).unwrap();
        }
        worker.drain();

        assert_eq!(*order.lock(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn jobs_run_off_the_submitting_thread() {
        let worker = BackgroundWorker::spawn("roster-test-thread").unwrap();
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        worker
            .submit(move || {
                *sink.lock() = std::thread::current().name().map(str::to_string);
            })
            .unwrap();
        worker.drain();

        assert_eq!(seen.lock().as_deref(), Some("roster-test-thread"));
    }

    #[test]
    fn panicking_job_does_not_stop_the_worker() {
        let worker = BackgroundWorker::spawn("roster-test-panic").unwrap();
        let ran = Arc::new(Mutex::new(false));

        worker.submit(|| panic!("boom")).unwrap();
        worker.submit(|| panic!("boom {}\nsecond line", 2)).unwrap();
        let flag = Arc::clone(&ran);
        worker.submit(move || *flag.lock() = true).unwrap();
        worker.drain();

        assert!(*ran.lock());
    }

    #[test]
    fn shutdown_finishes_queued_jobs_and_rejects_new_ones() {
        let worker = BackgroundWorker::spawn("roster-test-shutdown").unwrap();
        let count = Arc::new(Mutex::new(0));

        for _ in 0..5 {
            let count = Arc::clone(&count);
            worker.submit(move || *count.lock() += 1).unwrap();
        }
        worker.shutdown();
        worker.shutdown();

        assert_eq!(*count.lock(), 5);
        assert_eq!(worker.submit(|| {}), Err(WorkerClosed));
    }
}
