use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::Db;
use crate::models::{AlertRule, Monitor, MonitorType, TriggerType};
use crate::store::{AlertRuleRepo, CheckRepo, IncidentRepo, MonitorRepo};

/// Joins the enabled rule set with the latest check data for each applicable monitor and
/// opens/resolves incidents on state transitions. Runs across all tenants — the worker has
/// no tenant context of its own. A rule whose data can't be fetched is logged and skipped;
/// it does not block evaluation of the remaining rules.
pub async fn run_alert_evaluator(db: Arc<Db>) {
    let rules = {
        let conn = db.conn.lock().unwrap();
        match AlertRuleRepo::list_all_enabled(&conn) {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = %e, "failed to list enabled alert rules");
                return;
            }
        }
    };

    for rule in rules {
        if let Err(e) = evaluate_rule(&db, &rule).await {
            tracing::warn!(rule_id = %rule.id, error = %e, "failed to evaluate alert rule");
        }
    }
}

async fn evaluate_rule(db: &Arc<Db>, rule: &AlertRule) -> Result<(), String> {
    let monitors = applicable_monitors(db, rule)?;

    for monitor in monitors {
        evaluate_pair(db, rule, &monitor)?;
    }
    Ok(())
}

fn applicable_monitors(db: &Arc<Db>, rule: &AlertRule) -> Result<Vec<Monitor>, String> {
    let conn = db.conn.lock().unwrap();
    match &rule.monitor_id {
        Some(id) => {
            let monitor = MonitorRepo::get_any(&conn, id).map_err(|e| e.to_string())?;
            Ok(vec![monitor])
        }
        None => {
            let mut stmt = conn
                .prepare(
                    "SELECT id, tenant_id, name, target, monitor_type, keyword, \
                     check_interval_seconds, timeout_seconds, enabled, check_ssl, \
                     ssl_alert_days, last_checked_at, created_at, updated_at \
                     FROM monitors WHERE tenant_id = ?1 AND enabled = 1",
                )
                .map_err(|e| e.to_string())?;
            let rows = stmt
                .query_map([&rule.tenant_id], |row| {
                    Ok(Monitor {
                        id: row.get(0)?,
                        tenant_id: row.get(1)?,
                        name: row.get(2)?,
                        target: row.get(3)?,
                        monitor_type: row.get(4)?,
                        keyword: row.get(5)?,
                        check_interval_seconds: row.get(6)?,
                        timeout_seconds: row.get(7)?,
                        enabled: row.get::<_, i64>(8)? != 0,
                        check_ssl: row.get::<_, i64>(9)? != 0,
                        ssl_alert_days: row.get(10)?,
                        last_checked_at: row.get(11)?,
                        created_at: row.get(12)?,
                        updated_at: row.get(13)?,
                    })
                })
                .map_err(|e| e.to_string())?;
            Ok(rows.filter_map(|r| r.ok()).collect())
        }
    }
}

fn evaluate_pair(db: &Arc<Db>, rule: &AlertRule, monitor: &Monitor) -> Result<(), String> {
    let trigger_type = TriggerType::parse(&rule.trigger_type).ok_or("unknown trigger_type")?;
    let monitor_type = MonitorType::parse(&monitor.monitor_type);

    if trigger_type == TriggerType::SslExpiry && monitor_type != Some(MonitorType::Http) {
        return Ok(());
    }

    let conn = db.conn.lock().unwrap();

    let (fires, trigger_value) = match trigger_type {
        TriggerType::Down => {
            let failures = CheckRepo::get_consecutive_failures(&conn, &monitor.id)
                .map_err(|e| e.to_string())?;
            let fires = failures as i64 >= rule.threshold_value;
            (
                fires,
                format!("{failures} consecutive failed checks (threshold {})", rule.threshold_value),
            )
        }
        TriggerType::SlowResponse => {
            let latest = CheckRepo::get_latest(&conn, &monitor.id).map_err(|e| e.to_string())?;
            match latest {
                Some(check) if check.success && check.response_time_ms as i64 > rule.threshold_value => (
                    true,
                    format!(
                        "response time {}ms exceeded threshold {}ms",
                        check.response_time_ms, rule.threshold_value
                    ),
                ),
                _ => (false, String::new()),
            }
        }
        TriggerType::SslExpiry => {
            let latest = CheckRepo::get_latest(&conn, &monitor.id).map_err(|e| e.to_string())?;
            match latest.and_then(|c| c.ssl_expires_at.map(|exp| (exp, c.ssl_valid))) {
                Some((expires_at, _)) => {
                    let expires: Option<DateTime<Utc>> = DateTime::parse_from_rfc3339(&expires_at)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                        .or_else(|| DateTime::parse_from_rfc2822(&expires_at).ok().map(|dt| dt.with_timezone(&Utc)));
                    match expires {
                        Some(expires) => {
                            let days_left = (expires - Utc::now()).num_days();
                            let fires = days_left <= rule.threshold_value;
                            (
                                fires,
                                format!("certificate expires in {days_left} days (threshold {} days)", rule.threshold_value),
                            )
                        }
                        None => (false, String::new()),
                    }
                }
                None => (false, String::new()),
            }
        }
    };

    let existing_open = IncidentRepo::get_open(&conn, &monitor.id, &rule.id).map_err(|e| e.to_string())?;

    match (fires, existing_open) {
        (true, None) => {
            IncidentRepo::create(&conn, &monitor.id, &rule.id, &trigger_value)
                .map_err(|e| e.to_string())?;
        }
        (false, Some(incident)) => {
            IncidentRepo::resolve(&conn, &incident.id).map_err(|e| e.to_string())?;
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use uuid::Uuid;

    use crate::models::{CreateAlertRule, CreateMonitor};
    use crate::store::{AlertRuleRepo, MonitorRepo, TenantRepo};

    fn test_db() -> Arc<Db> {
        let path = format!("/tmp/sentinelcheck_evaluator_test_{}.db", Uuid::new_v4());
        Arc::new(Db::new(&path).expect("db init failed"))
    }

    fn create_monitor(db: &Arc<Db>, tenant_id: &str) -> Monitor {
        let conn = db.conn.lock().unwrap();
        MonitorRepo::create(
            &conn,
            tenant_id,
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
        .expect("monitor create failed")
    }

    fn record_check(db: &Arc<Db>, monitor_id: &str, success: bool) {
        let conn = db.conn.lock().unwrap();
        CheckRepo::save_check(&conn, monitor_id, None, 10, success, None, None, None)
            .expect("save_check failed");
    }

    #[tokio::test]
    async fn down_trigger_opens_then_resolves_with_dedup() {
        let db = test_db();
        let tenant = {
            let conn = db.conn.lock().unwrap();
            TenantRepo::create(&conn, "acme").expect("tenant create failed")
        };
        let monitor = create_monitor(&db, &tenant.id);
        let rule = {
            let conn = db.conn.lock().unwrap();
            AlertRuleRepo::create(
                &conn,
                &tenant.id,
                &CreateAlertRule {
                    name: "down twice".into(),
                    monitor_id: Some(monitor.id.clone()),
                    trigger_type: "down".into(),
                    threshold_value: 2,
                    channel_ids: vec![],
                },
            )
            .expect("rule create failed")
        };

        record_check(&db, &monitor.id, false);
        run_alert_evaluator(db.clone()).await;
        {
            let conn = db.conn.lock().unwrap();
            let open = IncidentRepo::get_open(&conn, &monitor.id, &rule.id).unwrap();
            assert!(open.is_none(), "one failure must not yet open an incident");
        }

        record_check(&db, &monitor.id, false);
        run_alert_evaluator(db.clone()).await;
        let first_incident_id = {
            let conn = db.conn.lock().unwrap();
            let open = IncidentRepo::get_open(&conn, &monitor.id, &rule.id).unwrap();
            open.expect("two consecutive failures must open an incident").id
        };

        run_alert_evaluator(db.clone()).await;
        {
            let conn = db.conn.lock().unwrap();
            let open = IncidentRepo::get_open(&conn, &monitor.id, &rule.id).unwrap();
            assert_eq!(
                open.expect("incident must still be open").id,
                first_incident_id,
                "re-evaluating while still failing must not open a second incident"
            );
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM incidents WHERE monitor_id = ?1 AND alert_rule_id = ?2",
                    params![monitor.id, rule.id],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "dedup must not create a second incident row");
        }

        record_check(&db, &monitor.id, true);
        run_alert_evaluator(db.clone()).await;
        {
            let conn = db.conn.lock().unwrap();
            let open = IncidentRepo::get_open(&conn, &monitor.id, &rule.id).unwrap();
            assert!(open.is_none(), "a recovered check must resolve the incident");
            let incident = IncidentRepo::get(&conn, &first_incident_id).unwrap();
            assert_eq!(incident.status, "resolved");
        }
    }
}
