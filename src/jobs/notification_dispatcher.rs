use std::sync::Arc;

use crate::config::Config;
use crate::db::Db;
use crate::models::{AlertChannel, Incident};
use crate::notifications::{self, NotificationPayload};
use crate::store::{AlertChannelRepo, IncidentRepo, MonitorRepo};

const BATCH_SIZE: u32 = 100;

/// Delivers each unnotified incident transition (open, resolve) to every enabled channel
/// linked to that incident's rule. A transition is marked notified only once every channel
/// dispatch for it has succeeded; otherwise it is retried whole on the next tick.
pub async fn run_notification_dispatcher(db: Arc<Db>, config: Arc<Config>) {
    let incidents = {
        let conn = db.conn.lock().unwrap();
        match IncidentRepo::list_unnotified(&conn, BATCH_SIZE) {
            Ok(incidents) => incidents,
            Err(e) => {
                tracing::error!(error = %e, "failed to list unnotified incidents");
                return;
            }
        }
    };

    for incident in incidents {
        dispatch_incident(&db, &config, &incident).await;
    }
}

async fn dispatch_incident(db: &Arc<Db>, config: &Arc<Config>, incident: &Incident) {
    let (channels, monitor_name, monitor_target) = {
        let conn = db.conn.lock().unwrap();
        let channels = match AlertChannelRepo::list_by_rule(&conn, &incident.alert_rule_id) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(incident_id = %incident.id, error = %e, "failed to list channels for rule");
                return;
            }
        };
        let monitor = MonitorRepo::get_any(&conn, &incident.monitor_id).ok();
        let (name, target) = monitor
            .map(|m| (m.name, m.target))
            .unwrap_or_else(|| ("unknown monitor".to_string(), String::new()));
        (channels, name, target)
    };

    if incident.opened_notified_at.is_none() {
        let payload = NotificationPayload {
            incident_id: incident.id.clone(),
            monitor_name: monitor_name.clone(),
            monitor_target: monitor_target.clone(),
            status: "open".to_string(),
            message: incident.trigger_value.clone(),
            timestamp: incident.started_at.clone(),
        };
        if fan_out(config, &channels, &payload).await {
            let conn = db.conn.lock().unwrap();
            if let Err(e) = IncidentRepo::mark_open_notified(&conn, &incident.id) {
                tracing::error!(incident_id = %incident.id, error = %e, "failed to mark opened-notified");
            }
        }
    }

    if incident.status == "resolved" && incident.resolved_notified_at.is_none() {
        let payload = NotificationPayload {
            incident_id: incident.id.clone(),
            monitor_name,
            monitor_target,
            status: "resolved".to_string(),
            message: format!("{} has recovered", incident.trigger_value),
            timestamp: incident.resolved_at.clone().unwrap_or_default(),
        };
        if fan_out(config, &channels, &payload).await {
            let conn = db.conn.lock().unwrap();
            if let Err(e) = IncidentRepo::mark_resolved_notified(&conn, &incident.id) {
                tracing::error!(incident_id = %incident.id, error = %e, "failed to mark resolved-notified");
            }
        }
    }
}

async fn fan_out(config: &Arc<Config>, channels: &[AlertChannel], payload: &NotificationPayload) -> bool {
    let mut all_ok = true;
    for channel in channels {
        let result = match channel.channel_type.as_str() {
            "webhook" => notifications::send_webhook(channel, payload).await,
            "discord" => notifications::send_discord(channel, payload).await,
            "email" => notifications::send_email(config, channel, payload).await,
            other => {
                tracing::warn!(channel_type = other, "unknown channel type");
                Err("unknown channel type".to_string())
            }
        };
        if let Err(e) = result {
            tracing::warn!(channel_id = %channel.id, error = %e, "notification dispatch failed");
            all_ok = false;
        }
    }
    all_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::models::{CreateAlertRule, CreateMonitor};
    use crate::store::{AlertRuleRepo, MonitorRepo, TenantRepo};

    fn test_config() -> Arc<Config> {
        std::env::set_var("JWT_SECRET", "test-secret-do-not-use-in-prod");
        Arc::new(Config::from_env().expect("valid test config"))
    }

    fn test_db() -> Arc<Db> {
        let path = format!("/tmp/sentinelcheck_dispatcher_test_{}.db", Uuid::new_v4());
        Arc::new(Db::new(&path).expect("db init failed"))
    }

    /// A rule with no linked channels: `fan_out` over an empty slice vacuously succeeds,
    /// so the notify-once bookkeeping can be exercised without a real network call.
    #[tokio::test]
    async fn notifies_open_then_resolved_each_once() {
        let db = test_db();
        let config = test_config();

        let (monitor_id, rule_id) = {
            let conn = db.conn.lock().unwrap();
            let tenant = TenantRepo::create(&conn, "acme").expect("tenant create failed");
            let monitor = MonitorRepo::create(
                &conn,
                &tenant.id,
                &CreateMonitor {
                    name: "test monitor".into(),
                    target: "example.com:443".into(),
                    monitor_type: "tcp".into(),
                    keyword: None,
                    check_interval_seconds: 60,
                    timeout_seconds: 30,
                    check_ssl: false,
                    ssl_alert_days: 14,
                },
            )
            .expect("monitor create failed");
            let rule = AlertRuleRepo::create(
                &conn,
                &tenant.id,
                &CreateAlertRule {
                    name: "down".into(),
                    monitor_id: Some(monitor.id.clone()),
                    trigger_type: "down".into(),
                    threshold_value: 1,
                    channel_ids: vec![],
                },
            )
            .expect("rule create failed");
            (monitor.id, rule.id)
        };

        let incident_id = {
            let conn = db.conn.lock().unwrap();
            IncidentRepo::create(&conn, &monitor_id, &rule_id, "down")
                .expect("incident create failed")
                .id
        };

        run_notification_dispatcher(db.clone(), config.clone()).await;
        {
            let conn = db.conn.lock().unwrap();
            let incident = IncidentRepo::get(&conn, &incident_id).unwrap();
            assert!(incident.opened_notified_at.is_some(), "open transition must be notified");
            assert!(incident.resolved_notified_at.is_none(), "resolve must not yet be notified");
        }

        // Re-running while still open and already notified must not touch resolved_notified_at.
        run_notification_dispatcher(db.clone(), config.clone()).await;
        {
            let conn = db.conn.lock().unwrap();
            let incident = IncidentRepo::get(&conn, &incident_id).unwrap();
            assert!(incident.resolved_notified_at.is_none());
        }

        {
            let conn = db.conn.lock().unwrap();
            IncidentRepo::resolve(&conn, &incident_id).expect("resolve failed");
        }

        run_notification_dispatcher(db.clone(), config.clone()).await;
        {
            let conn = db.conn.lock().unwrap();
            let incident = IncidentRepo::get(&conn, &incident_id).unwrap();
            assert!(incident.opened_notified_at.is_some());
            assert!(incident.resolved_notified_at.is_some(), "resolve transition must be notified");
        }
    }
}
