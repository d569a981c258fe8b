use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};

use crate::auth::AuthUser;
use crate::db::Db;
use crate::error::{AppError, ErrorBody};
use crate::models::{Incident, IncidentFilter};
use crate::store::IncidentRepo;

#[get("/incidents?<status>&<monitor_id>&<since>&<until>")]
pub fn list_incidents(
    auth: AuthUser,
    status: Option<String>,
    monitor_id: Option<String>,
    since: Option<String>,
    until: Option<String>,
    db: &State<Arc<Db>>,
) -> Result<Json<Vec<Incident>>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let filter = IncidentFilter {
        status,
        monitor_id,
        since,
        until,
    };
    let incidents = IncidentRepo::list(&conn, &auth.tenant_id, &filter).map_err(AppError::into_response)?;
    Ok(Json(incidents))
}
