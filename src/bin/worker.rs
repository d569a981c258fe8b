use std::sync::Arc;
use std::time::Duration;

use sentinelcheck::config::Config;
use sentinelcheck::db::Db;
use sentinelcheck::jobs;
use sentinelcheck::scheduler::Scheduler;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Arc::new(Config::from_env()?);
    let db = Arc::new(Db::new(&config.database_path)?);

    let scheduler = Scheduler::new().await?;

    let health_db = db.clone();
    let concurrency = config.health_check_concurrency;
    scheduler
        .register(
            "health_check",
            "*/30 * * * * *",
            Arc::new(move || {
                let db = health_db.clone();
                Box::pin(async move { jobs::run_health_check(db, concurrency).await })
            }),
        )
        .await?;

    let ssl_db = db.clone();
    scheduler
        .register(
            "ssl_check",
            "0 */5 * * * *",
            Arc::new(move || {
                let db = ssl_db.clone();
                Box::pin(async move { jobs::run_ssl_check(db).await })
            }),
        )
        .await?;

    let evaluator_db = db.clone();
    scheduler
        .register(
            "alert_evaluator",
            "0 * * * * *",
            Arc::new(move || {
                let db = evaluator_db.clone();
                Box::pin(async move { jobs::run_alert_evaluator(db).await })
            }),
        )
        .await?;

    let dispatcher_db = db.clone();
    let dispatcher_config = config.clone();
    scheduler
        .register(
            "notification_dispatcher",
            "*/30 * * * * *",
            Arc::new(move || {
                let db = dispatcher_db.clone();
                let config = dispatcher_config.clone();
                Box::pin(async move { jobs::run_notification_dispatcher(db, config).await })
            }),
        )
        .await?;

    scheduler.start().await?;
    tracing::info!("worker started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, draining in-flight jobs");
    scheduler.shutdown(SHUTDOWN_GRACE).await?;

    Ok(())
}
