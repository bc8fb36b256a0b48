// SPDX-License-Identifier: MIT
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

use super::script::ScriptEvaluator;
use super::SyncError;

const IDLE_WAIT: Duration = Duration::from_millis(50);

/// Outcome of one script evaluation, tagged with the generation it was
/// submitted under.
#[derive(Debug)]
pub struct ScriptOutcome {
    pub generation: u64,
    pub result: Result<Value, SyncError>,
}

struct Job {
    generation: u64,
    source: String,
}

/// Runs script evaluations off the UI thread. Only the newest queued job is
/// evaluated; older ones still waiting are skipped.
pub struct ScriptWorker {
    jobs: Option<Sender<Job>>,
    outcomes: Receiver<ScriptOutcome>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ScriptWorker {
    /// Spawns the evaluation thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(evaluator: Box<dyn ScriptEvaluator>) -> anyhow::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("script-eval".into())
            .spawn(move || {
                while !shutdown_clone.load(Ordering::Relaxed) {
                    let mut job = match job_rx.recv_timeout(IDLE_WAIT) {
                        Ok(job) => job,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    };
                    while let Ok(newer) = job_rx.try_recv() {
                        job = newer;
                    }
                    tracing::debug!(generation = job.generation, "evaluating script");
                    let result = evaluator.evaluate(&job.source);
                    let outcome = ScriptOutcome {
                        generation: job.generation,
                        result,
                    };
                    if outcome_tx.send(outcome).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| anyhow::anyhow!("failed to spawn script-eval thread: {e}"))?;

        Ok(Self {
            jobs: Some(job_tx),
            outcomes: outcome_rx,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, generation: u64, source: String) {
        if let Some(jobs) = &self.jobs
            && jobs.send(Job { generation, source }).is_err()
        {
            tracing::warn!(generation, "script worker is gone; dropping job");
        }
    }

    /// Next finished evaluation, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<ScriptOutcome> {
        match self.outcomes.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.jobs = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ScriptWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    struct Echo;

    impl ScriptEvaluator for Echo {
        fn evaluate(&self, source: &str) -> Result<Value, SyncError> {
            serde_json::from_str(source)
                .map_err(|e| SyncError::ScriptEvaluationFailure(e.to_string()))
        }
    }

    fn wait_for(worker: &ScriptWorker) -> ScriptOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = worker.try_recv() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "worker produced no outcome");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn evaluates_submitted_job() {
        let worker = ScriptWorker::spawn(Box::new(Echo)).unwrap();
        worker.submit(7, "[1, 2]".into());
        let outcome = wait_for(&worker);
        assert_eq!(outcome.generation, 7);
        assert_eq!(outcome.result.unwrap(), serde_json::json!([1, 2]));
    }

    #[test]
    fn failures_are_reported_not_dropped() {
        let worker = ScriptWorker::spawn(Box::new(Echo)).unwrap();
        worker.submit(1, "not json".into());
        assert!(wait_for(&worker).result.is_err());
    }

    #[test]
    fn shutdown_joins_thread() {
        let mut worker = ScriptWorker::spawn(Box::new(Echo)).unwrap();
        worker.shutdown();
        assert!(worker.handle.is_none());
        worker.submit(2, "1".into());
        assert!(worker.try_recv().is_none());
    }
}
