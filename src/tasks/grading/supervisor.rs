use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Owns every detached grading task.
///
/// Spawning never waits: tasks queue on the semaphore inside their own
/// future, so at most `max_concurrency` of them run their body at once.
#[derive(Clone)]
pub(crate) struct WorkerSupervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    tasks: Mutex<JoinSet<()>>,
    permits: Arc<Semaphore>,
}

impl WorkerSupervisor {
    pub(crate) fn new(max_concurrency: usize) -> Self {
        Self {
            inner: Arc::new(SupervisorInner {
                tasks: Mutex::new(JoinSet::new()),
                permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            }),
        }
    }

    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.inner.permits);
        let mut tasks = self.lock_tasks();

        while let Some(finished) = tasks.try_join_next() {
            log_join_result(finished);
        }

        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                tracing::warn!("Grading worker dropped: supervisor closed");
                return;
            };
            task.await;
        });
    }

    /// Number of tasks spawned and not yet reaped.
    pub(crate) fn in_flight(&self) -> usize {
        self.lock_tasks().len()
    }

    /// Waits for every task spawned so far, including tasks spawned while
    /// draining.
    pub(crate) async fn drain(&self) {
        loop {
            let mut batch = std::mem::take(&mut *self.lock_tasks());
            if batch.is_empty() {
                return;
            }
            while let Some(finished) = batch.join_next().await {
                log_join_result(finished);
            }
        }
    }

    fn lock_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.inner.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    match result {
        Ok(()) => {}
        Err(err) if err.is_panic() => {
            tracing::error!(error = %err, "Grading worker panicked");
            metrics::counter!("grading_jobs_total", "status" => "panicked").increment(1);
        }
        Err(err) => tracing::warn!(error = %err, "Grading worker was cancelled"),
    }
}
