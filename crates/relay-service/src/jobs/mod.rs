//! Startup self-test and periodic maintenance
//!
//! The application assembles the job list and hands it to the `Scheduler`;
//! the relay engine knows nothing about either.

mod scheduler;

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use crate::services::{ServiceContext, ServiceResult};

pub use scheduler::{until_next_midnight, Scheduler};
pub use self_test::{SelfTest, SelfTestReport, SPAM_TOPIC_NAME};

type JobFn = dyn Fn() -> BoxFuture<'static, ServiceResult<()>> + Send + Sync;

/// Named unit of periodic work
#[derive(Clone)]
pub struct Job {
    name: &'static str,
    run: Arc<JobFn>,
}

impl Job {
    pub fn new<F, Fut>(name: &'static str, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult<()>> + Send + 'static,
    {
        Self {
            name,
            run: Arc::new(move || run().boxed()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn run(&self) -> ServiceResult<()> {
        (self.run)().await
    }

    /// Wipe the session cache, drop idle user mutexes and stale flood queues
    pub fn cleanup_cache(ctx: Arc<ServiceContext>) -> Self {
        Self::new("cleanup_cache", move || clean_cache(Arc::clone(&ctx)))
    }

    /// Delete message mappings older than the retention period
    pub fn cleanup_db(ctx: Arc<ServiceContext>) -> Self {
        Self::new("cleanup_db", move || clean_mappings(Arc::clone(&ctx)))
    }
}

async fn clean_cache(ctx: Arc<ServiceContext>) -> ServiceResult<()> {
    let cache = ctx.cache();
    cache.clear_all();
    let locks = cache.locks().prune_idle();
    let queues = cache.flood().sweep(ctx.settings().flood_window);
    info!(locks, queues, "Session cache cleaned");
    Ok(())
}

async fn clean_mappings(ctx: Arc<ServiceContext>) -> ServiceResult<()> {
    let days = i64::from(ctx.settings().retention_days);
    let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
    let deleted = ctx.mapping_repo().delete_older_than(cutoff).await?;
    info!(deleted, retention_days = days, "Old message mappings deleted");
    Ok(())
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("name", &self.name).finish()
    }
}

/// Standard daily jobs
pub fn daily_jobs(ctx: &Arc<ServiceContext>) -> Vec<Job> {
    vec![
        Job::cleanup_cache(Arc::clone(ctx)),
        Job::cleanup_db(Arc::clone(ctx)),
    ]
}
