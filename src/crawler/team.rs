//! Generic bounded worker pool
//!
//! A [`Team`] fans jobs out to a fixed number of workers that pull from a
//! shared job channel, and fans successful results back in. Jobs whose worker
//! returns an error are dropped; no job is retried and `run` never fails.
//!
//! ```text
//!   jobs ──▶ mpsc ──▶ ┌ worker 0 ┐
//!                     │ worker 1 │ ──▶ mpsc ──▶ Vec<R>
//!                     └ worker n ┘
//! ```

use futures::future::BoxFuture;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type WorkerFn<J, R> = dyn Fn(J) -> BoxFuture<'static, Result<R, String>> + Send + Sync;

/// Worker pool parameterized by job and result types
pub struct Team<J, R> {
    name: &'static str,
    workers: usize,
    worker: Arc<WorkerFn<J, R>>,
}

impl<J, R> Clone for Team<J, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            workers: self.workers,
            worker: Arc::clone(&self.worker),
        }
    }
}

impl<J, R> Team<J, R>
where
    J: Send + 'static,
    R: Send + 'static,
{
    /// Create a team of `workers` running `worker` on every job.
    ///
    /// The worker's error type only needs to be displayable; errors are
    /// logged and the job is dropped.
    pub fn new<F, Fut, E>(name: &'static str, workers: usize, worker: F) -> Self
    where
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let worker: Arc<WorkerFn<J, R>> = Arc::new(move |job: J| {
            let fut = worker(job);
            Box::pin(async move { fut.await.map_err(|e| e.to_string()) })
                as BoxFuture<'static, Result<R, String>>
        });

        Self {
            name,
            workers,
            worker,
        }
    }

    /// Run every job and collect the successful results.
    ///
    /// Spawns `min(workers, jobs.len())` workers (at least one when there are
    /// jobs). Result order is unspecified.
    pub async fn run(&self, jobs: Vec<J>) -> Vec<R> {
        let total = jobs.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.workers.clamp(1, total);
        debug!(team = self.name, jobs = total, workers, "Starting team");

        let (job_tx, job_rx) = mpsc::channel::<J>(total);
        for job in jobs {
            // buffer holds every job, receiver is alive
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        let (result_tx, mut result_rx) = mpsc::channel::<R>(total);
        let handles = self.spawn_workers(workers, job_rx, result_tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(team = self.name, error = %e, "Worker task aborted");
            }
        }

        debug!(
            team = self.name,
            jobs = total,
            succeeded = results.len(),
            dropped = total - results.len(),
            "Team finished"
        );
        results
    }

    fn spawn_workers(
        &self,
        workers: usize,
        job_rx: mpsc::Receiver<J>,
        result_tx: mpsc::Sender<R>,
    ) -> Vec<JoinHandle<()>> {
        let job_rx = Arc::new(Mutex::new(job_rx));
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let worker = Arc::clone(&self.worker);
            let name = self.name;

            handles.push(tokio::spawn(async move {
                loop {
                    let job = {
                        let mut rx = job_rx.lock().await;
                        rx.recv().await
                    };

                    let Some(job) = job else {
                        break;
                    };

                    match worker(job).await {
                        Ok(result) => {
                            if result_tx.send(result).await.is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            debug!(team = name, worker_id, error = %error, "Job dropped");
                        }
                    }
                }
            }));
        }

        handles
    }
}
