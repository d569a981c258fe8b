use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AlertRule, CreateAlertRule, TriggerType, UpdateAlertRule};

use super::{AlertChannelRepo, MonitorRepo};

pub struct AlertRuleRepo;

/// A rule's `monitor_id`, if set, must name a monitor in the same tenant; an `ssl_expiry`
/// rule pinned to a monitor additionally requires that monitor to be http with
/// `check_ssl` enabled, per the rule's invariants.
fn validate_monitor(
    conn: &Connection,
    tenant_id: &str,
    monitor_id: Option<&str>,
    trigger_type: TriggerType,
) -> Result<(), AppError> {
    let Some(monitor_id) = monitor_id else {
        return Ok(());
    };
    let monitor = MonitorRepo::get(conn, tenant_id, monitor_id).map_err(|_| {
        AppError::Validation("monitor_id does not reference a monitor in this tenant".into())
    })?;
    if trigger_type == TriggerType::SslExpiry && !(monitor.monitor_type == "http" && monitor.check_ssl) {
        return Err(AppError::Validation(
            "ssl_expiry rules with a monitor_id must point to an http monitor with check_ssl enabled".into(),
        ));
    }
    Ok(())
}

/// Every linked channel must belong to the same tenant as the rule.
fn validate_channels(conn: &Connection, tenant_id: &str, channel_ids: &[String]) -> Result<(), AppError> {
    for channel_id in channel_ids {
        AlertChannelRepo::get(conn, tenant_id, channel_id).map_err(|_| {
            AppError::Validation(format!(
                "channel_id {channel_id} does not reference a channel in this tenant"
            ))
        })?;
    }
    Ok(())
}

fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<(String, String, String, Option<String>, String, i64, bool, String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get::<_, i64>(6)? != 0,
        row.get(7)?,
    ))
}

const SELECT_COLUMNS: &str =
    "id, tenant_id, name, monitor_id, trigger_type, threshold_value, enabled, created_at";

impl AlertRuleRepo {
    fn hydrate(conn: &Connection, row: (String, String, String, Option<String>, String, i64, bool, String)) -> Result<AlertRule, AppError> {
        let (id, tenant_id, name, monitor_id, trigger_type, threshold_value, enabled, created_at) = row;
        let channel_ids = Self::channel_ids(conn, &id)?;
        Ok(AlertRule {
            id,
            tenant_id,
            name,
            monitor_id,
            trigger_type,
            threshold_value,
            enabled,
            created_at,
            channel_ids,
        })
    }

    fn channel_ids(conn: &Connection, rule_id: &str) -> Result<Vec<String>, AppError> {
        let mut stmt = conn.prepare(
            "SELECT alert_channel_id FROM alert_rule_channels WHERE alert_rule_id = ?1",
        )?;
        let rows = stmt.query_map(params![rule_id], |row| row.get::<_, String>(0))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn create(
        conn: &Connection,
        tenant_id: &str,
        input: &CreateAlertRule,
    ) -> Result<AlertRule, AppError> {
        let trigger_type = TriggerType::parse(&input.trigger_type)
            .ok_or_else(|| AppError::Validation("unknown trigger_type".into()))?;
        validate_monitor(conn, tenant_id, input.monitor_id.as_deref(), trigger_type)?;
        validate_channels(conn, tenant_id, &input.channel_ids)?;

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO alert_rules (id, tenant_id, name, monitor_id, trigger_type, threshold_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                tenant_id,
                input.name,
                input.monitor_id,
                input.trigger_type,
                input.threshold_value,
            ],
        )?;
        for channel_id in &input.channel_ids {
            conn.execute(
                "INSERT OR IGNORE INTO alert_rule_channels (alert_rule_id, alert_channel_id) \
                 VALUES (?1, ?2)",
                params![id, channel_id],
            )?;
        }
        Self::get(conn, tenant_id, &id)
    }

    pub fn get(conn: &Connection, tenant_id: &str, id: &str) -> Result<AlertRule, AppError> {
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM alert_rules WHERE id = ?1 AND tenant_id = ?2"),
                params![id, tenant_id],
                row_to_rule,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
                other => AppError::Store(other),
            })?;
        Self::hydrate(conn, row)
    }

    pub fn list(conn: &Connection, tenant_id: &str) -> Result<Vec<AlertRule>, AppError> {
        let rows = {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM alert_rules WHERE tenant_id = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt.query_map(params![tenant_id], row_to_rule)?;
            rows.filter_map(|r| r.ok()).collect::<Vec<_>>()
        };
        rows.into_iter().map(|r| Self::hydrate(conn, r)).collect()
    }

    /// Cross-tenant: every enabled rule, used by the evaluator which has no tenant scope.
    pub fn list_all_enabled(conn: &Connection) -> Result<Vec<AlertRule>, AppError> {
        let rows = {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM alert_rules WHERE enabled = 1"
            ))?;
            let rows = stmt.query_map([], row_to_rule)?;
            rows.filter_map(|r| r.ok()).collect::<Vec<_>>()
        };
        rows.into_iter().map(|r| Self::hydrate(conn, r)).collect()
    }

    pub fn update(
        conn: &Connection,
        tenant_id: &str,
        id: &str,
        input: &UpdateAlertRule,
    ) -> Result<AlertRule, AppError> {
        Self::get(conn, tenant_id, id)?;

        if let Some(name) = &input.name {
            conn.execute(
                "UPDATE alert_rules SET name = ?1 WHERE id = ?2 AND tenant_id = ?3",
                params![name, id, tenant_id],
            )?;
        }
        if let Some(threshold) = input.threshold_value {
            conn.execute(
                "UPDATE alert_rules SET threshold_value = ?1 WHERE id = ?2 AND tenant_id = ?3",
                params![threshold, id, tenant_id],
            )?;
        }
        if let Some(enabled) = input.enabled {
            conn.execute(
                "UPDATE alert_rules SET enabled = ?1 WHERE id = ?2 AND tenant_id = ?3",
                params![enabled as i64, id, tenant_id],
            )?;
        }
        if let Some(channel_ids) = &input.channel_ids {
            validate_channels(conn, tenant_id, channel_ids)?;
            conn.execute(
                "DELETE FROM alert_rule_channels WHERE alert_rule_id = ?1",
                params![id],
            )?;
            for channel_id in channel_ids {
                conn.execute(
                    "INSERT OR IGNORE INTO alert_rule_channels (alert_rule_id, alert_channel_id) \
                     VALUES (?1, ?2)",
                    params![id, channel_id],
                )?;
            }
        }

        Self::get(conn, tenant_id, id)
    }

    pub fn delete(conn: &Connection, tenant_id: &str, id: &str) -> Result<(), AppError> {
        let changed = conn.execute(
            "DELETE FROM alert_rules WHERE id = ?1 AND tenant_id = ?2",
            params![id, tenant_id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub fn get_any(conn: &Connection, id: &str) -> Result<AlertRule, AppError> {
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM alert_rules WHERE id = ?1"),
                params![id],
                row_to_rule,
            )
            .optional()?
            .ok_or(AppError::NotFound)?;
        Self::hydrate(conn, row)
    }
}
