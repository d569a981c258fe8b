use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::MonitorCheck;

pub struct CheckRepo;

fn row_to_check(row: &rusqlite::Row) -> rusqlite::Result<MonitorCheck> {
    Ok(MonitorCheck {
        id: row.get(0)?,
        monitor_id: row.get(1)?,
        checked_at: row.get(2)?,
        status_code: row.get(3)?,
        response_time_ms: row.get(4)?,
        success: row.get::<_, i64>(5)? != 0,
        error_message: row.get(6)?,
        ssl_valid: row.get::<_, Option<i64>>(7)?.map(|v| v != 0),
        ssl_expires_at: row.get(8)?,
    })
}

const SELECT_COLUMNS: &str = "id, monitor_id, checked_at, status_code, response_time_ms, \
    success, error_message, ssl_valid, ssl_expires_at";

impl CheckRepo {
    pub fn save_check(
        conn: &Connection,
        monitor_id: &str,
        status_code: Option<u16>,
        response_time_ms: u32,
        success: bool,
        error_message: Option<&str>,
        ssl_valid: Option<bool>,
        ssl_expires_at: Option<&str>,
    ) -> Result<MonitorCheck, AppError> {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO monitor_checks (id, monitor_id, status_code, response_time_ms, \
             success, error_message, ssl_valid, ssl_expires_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                monitor_id,
                status_code,
                response_time_ms,
                success as i64,
                error_message,
                ssl_valid.map(|v| v as i64),
                ssl_expires_at,
            ],
        )?;
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM monitor_checks WHERE id = ?1"),
            params![id],
            row_to_check,
        )
        .map_err(AppError::Store)
    }

    pub fn get_latest(conn: &Connection, monitor_id: &str) -> Result<Option<MonitorCheck>, AppError> {
        conn.query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM monitor_checks WHERE monitor_id = ?1 \
                 ORDER BY checked_at DESC LIMIT 1"
            ),
            params![monitor_id],
            row_to_check,
        )
        .optional()
        .map_err(AppError::Store)
    }

    pub fn get_latest_by_monitor(
        conn: &Connection,
        monitor_id: &str,
        n: u32,
    ) -> Result<Vec<MonitorCheck>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM monitor_checks WHERE monitor_id = ?1 \
             ORDER BY checked_at DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![monitor_id, n], row_to_check)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Length of the run of most-recent failed checks, stopping at the first success
    /// (or at the start of history). Used by the `down` trigger type.
    pub fn get_consecutive_failures(conn: &Connection, monitor_id: &str) -> Result<u32, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM monitor_checks WHERE monitor_id = ?1 \
             ORDER BY checked_at DESC LIMIT 1000"
        ))?;
        let rows = stmt.query_map(params![monitor_id], row_to_check)?;
        let mut count = 0u32;
        for row in rows {
            let check = row.map_err(AppError::Store)?;
            if check.success {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}
