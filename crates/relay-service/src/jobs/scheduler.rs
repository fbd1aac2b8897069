//! Daily job scheduler

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use super::Job;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Runs its jobs every day at local midnight
#[derive(Debug, Default)]
pub struct Scheduler {
    jobs: Vec<Job>,
}

impl Scheduler {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    #[must_use]
    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Run every job once, in order, returning how many failed
    ///
    /// A failing job is logged and does not stop the ones after it.
    #[instrument(skip(self), fields(jobs = self.jobs.len()))]
    pub async fn run_all(&self) -> usize {
        let mut failed = 0;
        for job in &self.jobs {
            match job.run().await {
                Ok(()) => info!(job = job.name(), "Job finished"),
                Err(err) => {
                    failed += 1;
                    error!(job = job.name(), error = %err, "Job failed");
                }
            }
        }
        failed
    }

    /// Start the scheduling loop on the runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let delay = until_next_midnight(&Local::now());
                info!(delay = ?delay, "Next maintenance run scheduled");
                tokio::time::sleep(delay).await;
                self.run_all().await;
            }
        })
    }
}

/// Time from `now` to the next midnight of its time zone
///
/// Falls back to a full day when the next midnight does not exist locally.
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let next = now
        .date_naive()
        .succ_opt()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest());

    next.and_then(|next| next.signed_duration_since(now.clone()).to_std().ok())
        .unwrap_or(DAY)
}
