use std::sync::Arc;
use std::time::Duration;

use crate::db::Db;
use crate::probes::probe_tls;
use crate::store::{CheckRepo, MonitorRepo};

const TLS_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Re-inspects the certificate on every enabled HTTPS monitor, independent of the regular
/// health check cadence — certificate state changes far more slowly than uptime.
pub async fn run_ssl_check(db: Arc<Db>) {
    let monitors = {
        let conn = db.conn.lock().unwrap();
        match MonitorRepo::get_https_monitors_for_ssl_check(&conn) {
            Ok(monitors) => monitors,
            Err(e) => {
                tracing::error!(error = %e, "failed to list https monitors for ssl check");
                return;
            }
        }
    };

    for monitor in monitors {
        let url = match url::Url::parse(&monitor.target) {
            Ok(u) => u,
            Err(_) => continue,
        };
        let Some(host) = url.host_str() else { continue };
        let port = url.port_or_known_default().unwrap_or(443);

        let ssl = probe_tls(host, port, TLS_CHECK_TIMEOUT).await;

        let conn = db.conn.lock().unwrap();
        let result = CheckRepo::save_check(
            &conn,
            &monitor.id,
            None,
            0,
            ssl.valid,
            ssl.error.as_deref(),
            Some(ssl.valid),
            ssl.expires_at.as_deref(),
        );
        if let Err(e) = result {
            tracing::error!(monitor_id = %monitor.id, error = %e, "failed to save ssl check result");
        }
    }
}
