//! Periodic execution of the pipeline.
//!
//! The scheduler owns its run state instead of relying on globals. Runs never
//! overlap: the wait only starts after a run (including persistence and
//! notification) has returned. A failed run waits a shorter time before the
//! retry, so a broken setup turns into periodic retries rather than a busy
//! loop.

use chrono::{DateTime, Local};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Upper bound on the wait after a failed run.
pub const MAX_ERROR_WAIT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    error_wait: Duration,
    in_flight: bool,
    last_run: Option<DateTime<Local>>,
    last_outcome: Option<RunOutcome>,
    last_error: Option<String>,
    runs: u64,
    failures: u64,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            error_wait: interval.min(MAX_ERROR_WAIT),
            in_flight: false,
            last_run: None,
            last_outcome: None,
            last_error: None,
            runs: 0,
            failures: 0,
        }
    }

    pub fn last_run(&self) -> Option<DateTime<Local>> {
        self.last_run
    }

    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.last_outcome
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// How long to wait before the next run.
    pub fn wait_after(&self, outcome: RunOutcome) -> Duration {
        match outcome {
            RunOutcome::Succeeded => self.interval,
            RunOutcome::Failed => self.error_wait,
        }
    }

    /// Run `job` once and record how it went.
    pub async fn run_once<F, Fut, T, E>(&mut self, job: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        debug_assert!(!self.in_flight, "runs must not overlap");
        self.in_flight = true;
        info!(run = self.runs + 1, "Starting run");
        let result = job().await;
        self.in_flight = false;
        self.runs += 1;
        self.last_run = Some(Local::now());

        match &result {
            Ok(_) => {
                self.last_outcome = Some(RunOutcome::Succeeded);
                self.last_error = None;
            }
            Err(e) => {
                self.failures += 1;
                self.last_outcome = Some(RunOutcome::Failed);
                self.last_error = Some(e.to_string());
                error!(error = %e, failures = self.failures, "Run failed");
            }
        }
        result
    }

    /// Run `job` forever, sleeping between runs. Never returns.
    pub async fn run_forever<F, Fut, T, E>(&mut self, mut job: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        info!(interval = ?self.interval, error_wait = ?self.error_wait, "Scheduler started");
        loop {
            let _ = self.run_once(&mut job).await;
            let outcome = self.last_outcome().unwrap_or(RunOutcome::Failed);
            let wait = self.wait_after(outcome);
            info!(
                ?wait,
                runs = self.runs(),
                failures = self.failures(),
                last_run = ?self.last_run(),
                last_error = self.last_error().unwrap_or(""),
                "Waiting for next run"
            );
            tokio::time::sleep(wait).await;
        }
    }
}
