use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::db::Db;
use crate::models::{Monitor, MonitorType};
use crate::probes::{probe_http, probe_icmp, probe_tcp, ProbeResult};
use crate::store::{CheckRepo, MonitorRepo};

/// Selects due monitors and probes them concurrently, bounded by a worker-pool semaphore
/// so a large tenant fan-out can't starve the rest of the fleet. Each monitor gets its own
/// probe under its own configured deadline; failures to save one monitor's result are
/// logged and do not affect the others.
pub async fn run_health_check(db: Arc<Db>, concurrency: usize) {
    let monitors = {
        let conn = db.conn.lock().unwrap();
        match MonitorRepo::get_monitors_needing_check(&conn) {
            Ok(monitors) => monitors,
            Err(e) => {
                tracing::error!(error = %e, "failed to select due monitors");
                return;
            }
        }
    };

    if monitors.is_empty() {
        return;
    }

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::with_capacity(monitors.len());

    for monitor in monitors {
        let semaphore = semaphore.clone();
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            check_one(db, monitor).await;
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "health check task panicked");
        }
    }
}

async fn check_one(db: Arc<Db>, monitor: Monitor) {
    let timeout = Duration::from_secs(monitor.timeout_seconds as u64);
    let monitor_type = MonitorType::parse(&monitor.monitor_type);

    let result: ProbeResult = match monitor_type {
        Some(MonitorType::Http) => {
            probe_http(
                &monitor.target,
                monitor.keyword.as_deref(),
                monitor.check_ssl,
                timeout,
            )
            .await
        }
        Some(MonitorType::Tcp) => probe_tcp(&monitor.target, timeout).await,
        Some(MonitorType::Icmp) => probe_icmp(&monitor.target, timeout).await,
        None => {
            tracing::error!(monitor_id = %monitor.id, kind = %monitor.monitor_type, "unknown monitor type");
            return;
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let conn = db.conn.lock().unwrap();

    let save_result = CheckRepo::save_check(
        &conn,
        &monitor.id,
        result.status_code,
        result.latency_ms,
        result.success,
        result.error.as_deref(),
        result.ssl.as_ref().map(|s| s.valid),
        result.ssl.as_ref().and_then(|s| s.expires_at.as_deref()),
    );

    if let Err(e) = save_result {
        tracing::error!(monitor_id = %monitor.id, error = %e, "failed to save check result");
        return;
    }

    if let Err(e) = MonitorRepo::update_last_checked_at(&conn, &monitor.id, &now) {
        tracing::error!(monitor_id = %monitor.id, error = %e, "failed to update last_checked_at");
    }
}
