use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Incident, IncidentFilter};

pub struct IncidentRepo;

const SELECT_COLUMNS: &str = "id, monitor_id, alert_rule_id, started_at, resolved_at, status, \
    trigger_value, opened_notified_at, resolved_notified_at, created_at";

fn row_to_incident(row: &rusqlite::Row) -> rusqlite::Result<Incident> {
    Ok(Incident {
        id: row.get(0)?,
        monitor_id: row.get(1)?,
        alert_rule_id: row.get(2)?,
        started_at: row.get(3)?,
        resolved_at: row.get(4)?,
        status: row.get(5)?,
        trigger_value: row.get(6)?,
        opened_notified_at: row.get(7)?,
        resolved_notified_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl IncidentRepo {
    /// Inserts a new open incident. A unique constraint violation (a race with another
    /// evaluator run, which the scheduler's own-job exclusivity rules out in practice,
    /// but the API's manual-trigger path does not) is treated as "already open", not
    /// an error — the dedup invariant holds either way.
    pub fn create(
        conn: &Connection,
        monitor_id: &str,
        alert_rule_id: &str,
        trigger_value: &str,
    ) -> Result<Incident, AppError> {
        let id = Uuid::new_v4().to_string();
        let result = conn.execute(
            "INSERT INTO incidents (id, monitor_id, alert_rule_id, trigger_value) \
             VALUES (?1, ?2, ?3, ?4)",
            params![id, monitor_id, alert_rule_id, trigger_value],
        );
        match result {
            Ok(_) => Self::get(conn, &id),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::get_open(conn, monitor_id, alert_rule_id)?
                    .ok_or(AppError::NotFound)
            }
            Err(other) => Err(AppError::Store(other)),
        }
    }

    pub fn get(conn: &Connection, id: &str) -> Result<Incident, AppError> {
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM incidents WHERE id = ?1"),
            params![id],
            row_to_incident,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Store(other),
        })
    }

    pub fn get_open(
        conn: &Connection,
        monitor_id: &str,
        alert_rule_id: &str,
    ) -> Result<Option<Incident>, AppError> {
        conn.query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM incidents \
                 WHERE monitor_id = ?1 AND alert_rule_id = ?2 AND status = 'open'"
            ),
            params![monitor_id, alert_rule_id],
            row_to_incident,
        )
        .optional()
        .map_err(AppError::Store)
    }

    pub fn resolve(conn: &Connection, id: &str) -> Result<Incident, AppError> {
        conn.execute(
            "UPDATE incidents SET status = 'resolved', resolved_at = datetime('now') \
             WHERE id = ?1 AND status = 'open'",
            params![id],
        )?;
        Self::get(conn, id)
    }

    pub fn list_unnotified(conn: &Connection, limit: u32) -> Result<Vec<Incident>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM incidents \
             WHERE opened_notified_at IS NULL \
                OR (status = 'resolved' AND resolved_notified_at IS NULL) \
             ORDER BY created_at ASC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], row_to_incident)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn mark_open_notified(conn: &Connection, id: &str) -> Result<(), AppError> {
        conn.execute(
            "UPDATE incidents SET opened_notified_at = datetime('now') WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    pub fn mark_resolved_notified(conn: &Connection, id: &str) -> Result<(), AppError> {
        conn.execute(
            "UPDATE incidents SET resolved_notified_at = datetime('now') WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    /// Tenant-scoped list via a join against monitors, since incidents have no tenant_id
    /// column of their own (tenancy is inherited through the monitor, per the data model).
    pub fn list(
        conn: &Connection,
        tenant_id: &str,
        filter: &IncidentFilter,
    ) -> Result<Vec<Incident>, AppError> {
        let mut sql = format!(
            "SELECT i.id, i.monitor_id, i.alert_rule_id, i.started_at, i.resolved_at, \
             i.status, i.trigger_value, i.opened_notified_at, i.resolved_notified_at, i.created_at \
             FROM incidents i JOIN monitors m ON m.id = i.monitor_id \
             WHERE m.tenant_id = ?1"
        );
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(tenant_id.to_string())];

        if let Some(status) = &filter.status {
            sql.push_str(" AND i.status = ?");
            values.push(Box::new(status.clone()));
        }
        if let Some(monitor_id) = &filter.monitor_id {
            sql.push_str(" AND i.monitor_id = ?");
            values.push(Box::new(monitor_id.clone()));
        }
        if let Some(since) = &filter.since {
            sql.push_str(" AND i.started_at >= ?");
            values.push(Box::new(since.clone()));
        }
        if let Some(until) = &filter.until {
            sql.push_str(" AND i.started_at <= ?");
            values.push(Box::new(until.clone()));
        }
        sql.push_str(" ORDER BY i.started_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_incident)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}
