//! Background execution of margin and boolean jobs.
//!
//! Each submission gets a job id from a shared generation counter. Starting
//! a new job supersedes the previous one: the running computation observes
//! the change through its [`Deadline`] and stops early, and a response whose
//! id is no longer current is rejected by [`GeometryWorker::accept`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{BooleanOp, EngineConfig, MarginParams};
use crate::error::{Result, WorkerError};
use crate::fallback::Deadline;
use crate::geometry::Contour;
use crate::operations::boolean::{StructureBoolean, StructureOutcome};
use crate::operations::margin::{Margin, MarginOutcome};

/// A unit of work. Operands are owned copies of the caller's contours.
#[derive(Debug, Clone)]
pub enum Job {
    Margin {
        contours: Vec<Contour>,
        params: MarginParams,
        grid_spacing: f64,
    },
    Boolean {
        op: BooleanOp,
        a: Vec<Contour>,
        b: Vec<Contour>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    Margin(MarginOutcome),
    Boolean(StructureOutcome),
}

/// Result of one job, tagged with the id it was submitted under.
#[derive(Debug)]
pub struct JobResponse {
    pub job_id: u64,
    pub result: Result<JobOutput>,
}

/// Dispatches jobs to blocking threads under a deadline.
#[derive(Debug, Clone)]
pub struct GeometryWorker {
    generation: Arc<AtomicU64>,
    config: EngineConfig,
}

impl Default for GeometryWorker {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GeometryWorker {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    /// Id of the most recently submitted job (0 before any submission).
    #[must_use]
    pub fn current_job(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Supersedes the outstanding job without starting a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Runs `job` on a blocking thread and waits for it, at most for the
    /// configured worker timeout.
    ///
    /// Never fails itself: timeouts, panics and operation errors are carried
    /// in [`JobResponse::result`].
    pub async fn submit(&self, job: Job) -> JobResponse {
        let job_id = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let timeout = self.config.worker_timeout;
        let deadline = Deadline::after(timeout).with_generation(Arc::clone(&self.generation), job_id);
        let config = self.config;
        debug!(job_id, ?timeout, "submitting geometry job");

        let expires = tokio::time::Instant::now() + timeout;
        let handle = tokio::task::spawn_blocking(move || run(job, config, deadline));
        let result = match tokio::time::timeout_at(expires, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) if join.is_panic() => {
                warn!(job_id, "geometry job panicked");
                Err(WorkerError::Panicked { job: job_id }.into())
            }
            Ok(Err(_)) => Err(WorkerError::Aborted { job: job_id }.into()),
            Err(_) => {
                warn!(job_id, ?timeout, "geometry job timed out");
                Err(WorkerError::Timeout {
                    job: job_id,
                    after: timeout,
                }
                .into())
            }
        };
        JobResponse { job_id, result }
    }

    /// Returns the job's result if it answers the current request, or `None`
    /// for a stale response from a superseded job.
    #[must_use]
    pub fn accept(&self, response: JobResponse) -> Option<Result<JobOutput>> {
        let current = self.current_job();
        if response.job_id == current {
            Some(response.result)
        } else {
            debug!(job_id = response.job_id, current, "discarding stale response");
            None
        }
    }
}

fn run(job: Job, config: EngineConfig, deadline: Deadline) -> Result<JobOutput> {
    deadline.check()?;
    match job {
        Job::Margin {
            contours,
            params,
            grid_spacing,
        } => Margin::new(&contours, params)
            .with_grid_spacing(grid_spacing)
            .with_config(config)
            .with_deadline(deadline)
            .execute()
            .map(JobOutput::Margin),
        Job::Boolean { op, a, b } => StructureBoolean::new(op, &a, &b)
            .with_config(config)
            .with_deadline(deadline)
            .execute()
            .map(JobOutput::Boolean),
    }
}
