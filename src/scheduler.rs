use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler};

/// Thin wrapper around `tokio_cron_scheduler::JobScheduler`: register named `(cron, task)`
/// pairs, start them, and shut down with a grace period. `tokio-cron-scheduler` already
/// guarantees a job's own ticks never overlap, so the only thing this wrapper adds is the
/// shutdown grace period and a consistent logging point per job firing.
pub struct Scheduler {
    inner: JobScheduler,
}

pub type JobFn = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

impl Scheduler {
    pub async fn new() -> anyhow::Result<Self> {
        Ok(Scheduler {
            inner: JobScheduler::new().await?,
        })
    }

    pub async fn register(&self, name: &'static str, cron_expr: &str, task: JobFn) -> anyhow::Result<()> {
        let task = task.clone();
        let job = Job::new_async(cron_expr, move |_uuid, _l| {
            let task = task.clone();
            Box::pin(async move {
                tracing::info!(job = name, "tick start");
                task().await;
                tracing::info!(job = name, "tick end");
            })
        })?;
        self.inner.add(job).await?;
        Ok(())
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        self.inner.start().await?;
        Ok(())
    }

    pub async fn shutdown(mut self, grace: Duration) -> anyhow::Result<()> {
        let _ = tokio::time::timeout(grace, self.inner.shutdown()).await;
        Ok(())
    }
}
