//! Generic worker-thread pool used by both chunk generation and the
//! explosion BFS (spec §5): a bounded set of OS threads pull closures off
//! a shared queue and post results back over a channel. The main loop
//! never blocks on this — it polls `try_recv` once per `World::update`
//! (spec §9 "async generation without promises").

use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

type Job<T> = Box<dyn FnOnce() -> T + Send>;

pub struct WorkerPool<T: Send + 'static> {
    job_tx: Sender<(TaskId, Job<T>)>,
    result_rx: Receiver<(TaskId, T)>,
    next_id: AtomicU64,
    _workers: Vec<std::thread::JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(num_threads: usize) -> Self {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(TaskId, Job<T>)>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<(TaskId, T)>();

        let workers = (0..num_threads.max(1))
            .map(|i| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                std::thread::Builder::new()
                    .name(format!("voxel-worker-{i}"))
                    .spawn(move || {
                        while let Ok((id, job)) = job_rx.recv() {
                            let output = job();
                            if result_tx.send((id, output)).is_err() {
                                break;
                            }
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            job_tx,
            result_rx,
            next_id: AtomicU64::new(0),
            _workers: workers,
        }
    }

    /// Enqueue a job; returns the `TaskId` the eventual result will carry.
    pub fn submit<F>(&self, job: F) -> TaskId
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        // An unbounded channel never blocks; a send failure only happens
        // if every worker thread has panicked and dropped its receiver,
        // which we treat as a logic bug rather than something to recover
        // from gracefully at the call site.
        let _ = self.job_tx.send((id, Box::new(job)));
        id
    }

    /// Drain all results that have arrived since the last poll, without
    /// blocking. Called once per frame from `World::update`.
    pub fn poll(&self) -> Vec<(TaskId, T)> {
        self.result_rx.try_iter().collect()
    }
}

pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn submit_and_poll_round_trips() {
        let pool: WorkerPool<i32> = WorkerPool::new(2);
        let id = pool.submit(|| 40 + 2);

        let mut got = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while got.is_empty() && std::time::Instant::now() < deadline {
            got = pool.poll();
            if got.is_empty() {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        assert_eq!(got, vec![(id, 42)]);
    }
}
