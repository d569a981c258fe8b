use rusqlite::{params, Connection, OptionalExtension, ToSql};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CreateMonitor, Monitor, UpdateMonitor};

pub struct MonitorRepo;

const SELECT_COLUMNS: &str = "id, tenant_id, name, target, monitor_type, keyword, \
    check_interval_seconds, timeout_seconds, enabled, check_ssl, ssl_alert_days, \
    last_checked_at, created_at, updated_at";

fn row_to_monitor(row: &rusqlite::Row) -> rusqlite::Result<Monitor> {
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
}

impl MonitorRepo {
    pub fn create(
        conn: &Connection,
        tenant_id: &str,
        input: &CreateMonitor,
    ) -> Result<Monitor, AppError> {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO monitors (id, tenant_id, name, target, monitor_type, keyword, \
             check_interval_seconds, timeout_seconds, check_ssl, ssl_alert_days) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                tenant_id,
                input.name,
                input.target,
                input.monitor_type,
                input.keyword,
                input.check_interval_seconds,
                input.timeout_seconds,
                input.check_ssl as i64,
                input.ssl_alert_days,
            ],
        )?;
        Self::get(conn, tenant_id, &id)
    }

    pub fn get(conn: &Connection, tenant_id: &str, id: &str) -> Result<Monitor, AppError> {
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM monitors WHERE id = ?1 AND tenant_id = ?2"),
            params![id, tenant_id],
            row_to_monitor,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Store(other),
        })
    }

    pub fn list(conn: &Connection, tenant_id: &str) -> Result<Vec<Monitor>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM monitors WHERE tenant_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map(params![tenant_id], row_to_monitor)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn update(
        conn: &Connection,
        tenant_id: &str,
        id: &str,
        input: &UpdateMonitor,
    ) -> Result<Monitor, AppError> {
        // Ensure the row exists and belongs to this tenant before building the dynamic
        // UPDATE, so we never leak whether a same-id row exists in another tenant.
        Self::get(conn, tenant_id, id)?;

        let mut set_clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(name) = &input.name {
            set_clauses.push("name = ?".into());
            values.push(Box::new(name.clone()));
        }
        if let Some(target) = &input.target {
            set_clauses.push("target = ?".into());
            values.push(Box::new(target.clone()));
        }
        if let Some(interval) = input.check_interval_seconds {
            set_clauses.push("check_interval_seconds = ?".into());
            values.push(Box::new(interval));
        }
        if let Some(timeout) = input.timeout_seconds {
            set_clauses.push("timeout_seconds = ?".into());
            values.push(Box::new(timeout));
        }
        if let Some(enabled) = input.enabled {
            set_clauses.push("enabled = ?".into());
            values.push(Box::new(enabled as i64));
        }
        if let Some(check_ssl) = input.check_ssl {
            set_clauses.push("check_ssl = ?".into());
            values.push(Box::new(check_ssl as i64));
        }
        if let Some(days) = input.ssl_alert_days {
            set_clauses.push("ssl_alert_days = ?".into());
            values.push(Box::new(days));
        }
        if let Some(keyword) = &input.keyword {
            set_clauses.push("keyword = ?".into());
            values.push(Box::new(keyword.clone()));
        }

        if set_clauses.is_empty() {
            return Self::get(conn, tenant_id, id);
        }

        set_clauses.push("updated_at = datetime('now')".into());
        let sql = format!(
            "UPDATE monitors SET {} WHERE id = ? AND tenant_id = ?",
            set_clauses.join(", ")
        );
        values.push(Box::new(id.to_string()));
        values.push(Box::new(tenant_id.to_string()));

        let param_refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, param_refs.as_slice())?;

        Self::get(conn, tenant_id, id)
    }

    pub fn delete(conn: &Connection, tenant_id: &str, id: &str) -> Result<(), AppError> {
        let changed = conn.execute(
            "DELETE FROM monitors WHERE id = ?1 AND tenant_id = ?2",
            params![id, tenant_id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Enabled monitors whose interval has elapsed, never-checked monitors first.
    pub fn get_monitors_needing_check(conn: &Connection) -> Result<Vec<Monitor>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM monitors \
             WHERE enabled = 1 AND (last_checked_at IS NULL \
                OR datetime(last_checked_at, '+' || check_interval_seconds || ' seconds') <= datetime('now')) \
             ORDER BY last_checked_at IS NOT NULL, last_checked_at ASC"
        ))?;
        let rows = stmt.query_map([], row_to_monitor)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Cross-tenant: every enabled HTTPS monitor with certificate inspection turned on.
    pub fn get_https_monitors_for_ssl_check(conn: &Connection) -> Result<Vec<Monitor>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM monitors \
             WHERE enabled = 1 AND monitor_type = 'http' AND check_ssl = 1"
        ))?;
        let rows = stmt.query_map([], row_to_monitor)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn update_last_checked_at(conn: &Connection, id: &str, ts: &str) -> Result<(), AppError> {
        conn.execute(
            "UPDATE monitors SET last_checked_at = ?1 WHERE id = ?2",
            params![ts, id],
        )?;
        Ok(())
    }

    /// Cross-tenant lookup used by the worker, which has no tenant context of its own.
    pub fn get_any(conn: &Connection, id: &str) -> Result<Monitor, AppError> {
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM monitors WHERE id = ?1"),
            params![id],
            row_to_monitor,
        )
        .optional()?
        .ok_or(AppError::NotFound)
    }
}
