use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::db::Db;
use crate::error::{AppError, ErrorBody};
use crate::store::{CheckRepo, IncidentRepo, MonitorRepo};

#[derive(Serialize)]
pub struct DashboardStats {
    pub total_monitors: u32,
    pub up: u32,
    pub down: u32,
    pub unknown: u32,
    pub open_incidents: u32,
}

#[get("/dashboard")]
pub fn dashboard(
    auth: AuthUser,
    db: &State<Arc<Db>>,
) -> Result<Json<DashboardStats>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let monitors = MonitorRepo::list(&conn, &auth.tenant_id).map_err(AppError::into_response)?;

    let mut up = 0;
    let mut down = 0;
    let mut unknown = 0;
    for monitor in &monitors {
        match CheckRepo::get_latest(&conn, &monitor.id).map_err(AppError::into_response)? {
            Some(check) if check.success => up += 1,
            Some(_) => down += 1,
            None => unknown += 1,
        }
    }

    let open_incidents = IncidentRepo::list(
        &conn,
        &auth.tenant_id,
        &crate::models::IncidentFilter {
            status: Some("open".to_string()),
            ..Default::default()
        },
    )
    .map_err(AppError::into_response)?
    .len() as u32;

    Ok(Json(DashboardStats {
        total_monitors: monitors.len() as u32,
        up,
        down,
        unknown,
        open_incidents,
    }))
}
