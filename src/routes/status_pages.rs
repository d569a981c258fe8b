use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

use crate::db::Db;
use crate::error::{AppError, ErrorBody};
use crate::store::{CheckRepo, MonitorRepo, TenantRepo};

use super::not_found;

#[derive(Serialize)]
pub struct StatusMonitor {
    pub name: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusOverview {
    pub overall: String,
    pub monitors: Vec<StatusMonitor>,
}

/// Public, unauthenticated status overview for a tenant, addressed by the slug minted at
/// registration. A check only ever resolves to up, down, or unknown (never checked), so
/// overall status has three states: any down monitor means a major outage, otherwise any
/// unknown means unknown, otherwise operational.
#[get("/status/<slug>")]
pub fn status_page(
    slug: &str,
    db: &State<Arc<Db>>,
) -> Result<Json<StatusOverview>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();

    let tenant_id = TenantRepo::find_by_slug(&conn, slug)
        .map_err(AppError::into_response)?
        .ok_or_else(not_found)?;

    let monitors = MonitorRepo::list(&conn, &tenant_id).map_err(AppError::into_response)?;

    let mut statuses = Vec::with_capacity(monitors.len());
    let mut any_down = false;
    let mut any_unknown = false;

    for monitor in &monitors {
        let latest = CheckRepo::get_latest(&conn, &monitor.id).map_err(AppError::into_response)?;
        let status = match latest {
            Some(check) if check.success => "up",
            Some(_) => {
                any_down = true;
                "down"
            }
            None => {
                any_unknown = true;
                "unknown"
            }
        };
        statuses.push(StatusMonitor {
            name: monitor.name.clone(),
            status: status.to_string(),
        });
    }

    let overall = if any_down {
        "major_outage"
    } else if any_unknown {
        "unknown"
    } else {
        "operational"
    };

    Ok(Json(StatusOverview {
        overall: overall.to_string(),
        monitors: statuses,
    }))
}
