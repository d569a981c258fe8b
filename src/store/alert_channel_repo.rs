use rusqlite::{params, Connection};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AlertChannel, CreateAlertChannel};

pub struct AlertChannelRepo;

fn row_to_channel(row: &rusqlite::Row) -> rusqlite::Result<AlertChannel> {
    let config_json: String = row.get(4)?;
    let config: HashMap<String, String> = serde_json::from_str(&config_json).unwrap_or_default();
    Ok(AlertChannel {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        channel_type: row.get(3)?,
        config,
        enabled: row.get::<_, i64>(5)? != 0,
    })
}

const SELECT_COLUMNS: &str = "id, tenant_id, name, channel_type, config, enabled";

impl AlertChannelRepo {
    pub fn create(
        conn: &Connection,
        tenant_id: &str,
        input: &CreateAlertChannel,
    ) -> Result<AlertChannel, AppError> {
        let id = Uuid::new_v4().to_string();
        let config_json = serde_json::to_string(&input.config)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        conn.execute(
            "INSERT INTO alert_channels (id, tenant_id, name, channel_type, config) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, tenant_id, input.name, input.channel_type, config_json],
        )?;
        Self::get(conn, tenant_id, &id)
    }

    pub fn get(conn: &Connection, tenant_id: &str, id: &str) -> Result<AlertChannel, AppError> {
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM alert_channels WHERE id = ?1 AND tenant_id = ?2"),
            params![id, tenant_id],
            row_to_channel,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Store(other),
        })
    }

    pub fn list(conn: &Connection, tenant_id: &str) -> Result<Vec<AlertChannel>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM alert_channels WHERE tenant_id = ?1"
        ))?;
        let rows = stmt.query_map(params![tenant_id], row_to_channel)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn delete(conn: &Connection, tenant_id: &str, id: &str) -> Result<(), AppError> {
        let changed = conn.execute(
            "DELETE FROM alert_channels WHERE id = ?1 AND tenant_id = ?2",
            params![id, tenant_id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Enabled channels linked to a rule, used by the dispatcher (cross-tenant context).
    pub fn list_by_rule(conn: &Connection, rule_id: &str) -> Result<Vec<AlertChannel>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT ac.id, ac.tenant_id, ac.name, ac.channel_type, ac.config, ac.enabled \
             FROM alert_channels ac \
             JOIN alert_rule_channels arc ON arc.alert_channel_id = ac.id \
             WHERE arc.alert_rule_id = ?1 AND ac.enabled = 1"
        ))?;
        let rows = stmt.query_map(params![rule_id], row_to_channel)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}
