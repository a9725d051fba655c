use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::orchestrator::Orchestrator;

/// Every 12 hours, on the hour.
pub const DEFAULT_SCHEDULE: &str = "0 0 */12 * * *";

/// Re-runs the changelog check on a cron schedule.
pub struct CheckScheduler {
    jobs: JobScheduler,
}

impl CheckScheduler {
    pub async fn new() -> Result<Self> {
        let jobs = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { jobs })
    }

    /// Register `orchestrator.run_once()` on `cron_expr` (six fields, seconds first).
    ///
    /// Runs that fire while a previous one is still going come back as
    /// `RunOutcome::Busy` from the orchestrator's own guard.
    pub async fn schedule_checks(
        &self,
        cron_expr: &str,
        orchestrator: Arc<Orchestrator>,
    ) -> Result<()> {
        let job = Job::new_async(cron_expr, move |_uuid, _jobs| {
            let orchestrator = orchestrator.clone();
            Box::pin(async move {
                info!("Scheduled changelog check starting");
                orchestrator.run_once().await.log();
            })
        })
        .with_context(|| format!("Invalid cron expression {:?}", cron_expr))?;

        self.jobs
            .add(job)
            .await
            .context("Failed to register changelog check")?;

        info!("Changelog check scheduled with cron: {}", cron_expr);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.jobs
            .start()
            .await
            .context("Failed to start scheduler")
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.jobs
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")
    }
}
