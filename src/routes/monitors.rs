use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use crate::auth::{AuthUser, ClientIp};
use crate::db::Db;
use crate::error::{AppError, ErrorBody};
use crate::models::{CreateMonitor, Monitor, MonitorCheck, MonitorType, UpdateMonitor};
use crate::rate_limiter::RateLimiter;
use crate::store::{CheckRepo, MonitorRepo};

use super::bad_request;

fn validate_create(input: &CreateMonitor) -> Result<(), (Status, Json<ErrorBody>)> {
    let monitor_type = MonitorType::parse(&input.monitor_type)
        .ok_or_else(|| bad_request("monitor_type must be one of: http, tcp, icmp"))?;

    if input.check_interval_seconds < 60 {
        return Err(bad_request("check_interval_seconds must be at least 60"));
    }
    if !(5..=120).contains(&input.timeout_seconds) {
        return Err(bad_request("timeout_seconds must be between 5 and 120"));
    }

    match monitor_type {
        MonitorType::Http => {
            url::Url::parse(&input.target).map_err(|_| bad_request("target must be an absolute URL for http monitors"))?;
        }
        MonitorType::Tcp => {
            validate_host_port(&input.target)?;
            if input.check_ssl {
                return Err(bad_request("check_ssl is not applicable to tcp monitors"));
            }
        }
        MonitorType::Icmp => {
            if input.target.contains("://") {
                return Err(bad_request("target must be a bare hostname or IP for icmp monitors"));
            }
            if input.check_ssl {
                return Err(bad_request("check_ssl is not applicable to icmp monitors"));
            }
        }
    }
    Ok(())
}

fn validate_host_port(addr: &str) -> Result<(), (Status, Json<ErrorBody>)> {
    let parts: Vec<&str> = addr.rsplitn(2, ':').collect();
    if parts.len() != 2 || parts[1].is_empty() {
        return Err(bad_request("tcp target must be in host:port format"));
    }
    match parts[0].parse::<u16>() {
        Ok(0) | Err(_) => Err(bad_request("tcp target port must be between 1 and 65535")),
        Ok(_) => Ok(()),
    }
}

#[post("/monitors", format = "json", data = "<input>")]
pub fn create_monitor(
    auth: AuthUser,
    client_ip: ClientIp,
    input: Json<CreateMonitor>,
    db: &State<Arc<Db>>,
    rate_limiter: &State<RateLimiter>,
) -> Result<Json<Monitor>, (Status, Json<ErrorBody>)> {
    if !rate_limiter.check(&client_ip.0) {
        return Err((
            Status::TooManyRequests,
            Json(ErrorBody {
                error: "rate limit exceeded".to_string(),
                code: "RATE_LIMIT_EXCEEDED".to_string(),
            }),
        ));
    }
    let input = input.into_inner();
    validate_create(&input)?;
    let conn = db.conn.lock().unwrap();
    let monitor = MonitorRepo::create(&conn, &auth.tenant_id, &input).map_err(AppError::into_response)?;
    Ok(Json(monitor))
}

#[get("/monitors")]
pub fn list_monitors(
    auth: AuthUser,
    db: &State<Arc<Db>>,
) -> Result<Json<Vec<Monitor>>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let monitors = MonitorRepo::list(&conn, &auth.tenant_id).map_err(AppError::into_response)?;
    Ok(Json(monitors))
}

#[get("/monitors/<id>")]
pub fn get_monitor(
    auth: AuthUser,
    id: &str,
    db: &State<Arc<Db>>,
) -> Result<Json<Monitor>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let monitor = MonitorRepo::get(&conn, &auth.tenant_id, id).map_err(AppError::into_response)?;
    Ok(Json(monitor))
}

#[patch("/monitors/<id>", format = "json", data = "<input>")]
pub fn update_monitor(
    auth: AuthUser,
    id: &str,
    input: Json<UpdateMonitor>,
    db: &State<Arc<Db>>,
) -> Result<Json<Monitor>, (Status, Json<ErrorBody>)> {
    let input = input.into_inner();
    if let Some(interval) = input.check_interval_seconds {
        if interval < 60 {
            return Err(bad_request("check_interval_seconds must be at least 60"));
        }
    }
    if let Some(timeout) = input.timeout_seconds {
        if !(5..=120).contains(&timeout) {
            return Err(bad_request("timeout_seconds must be between 5 and 120"));
        }
    }
    let conn = db.conn.lock().unwrap();
    let monitor = MonitorRepo::update(&conn, &auth.tenant_id, id, &input).map_err(AppError::into_response)?;
    Ok(Json(monitor))
}

#[delete("/monitors/<id>")]
pub fn delete_monitor(
    auth: AuthUser,
    id: &str,
    db: &State<Arc<Db>>,
) -> Result<Json<serde_json::Value>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    MonitorRepo::delete(&conn, &auth.tenant_id, id).map_err(AppError::into_response)?;
    Ok(Json(serde_json::json!({"message": "monitor deleted"})))
}

#[get("/monitors/<id>/checks?<limit>")]
pub fn get_monitor_checks(
    auth: AuthUser,
    id: &str,
    limit: Option<u32>,
    db: &State<Arc<Db>>,
) -> Result<Json<Vec<MonitorCheck>>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    MonitorRepo::get(&conn, &auth.tenant_id, id).map_err(AppError::into_response)?;
    let limit = limit.unwrap_or(50).min(500);
    let checks = CheckRepo::get_latest_by_monitor(&conn, id, limit).map_err(AppError::into_response)?;
    Ok(Json(checks))
}

#[get("/monitors/<id>/ssl-status")]
pub fn get_monitor_ssl_status(
    auth: AuthUser,
    id: &str,
    db: &State<Arc<Db>>,
) -> Result<Json<serde_json::Value>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    MonitorRepo::get(&conn, &auth.tenant_id, id).map_err(AppError::into_response)?;
    let latest = CheckRepo::get_latest(&conn, id).map_err(AppError::into_response)?;
    match latest {
        Some(check) => Ok(Json(serde_json::json!({
            "ssl_valid": check.ssl_valid,
            "ssl_expires_at": check.ssl_expires_at,
            "checked_at": check.checked_at,
        }))),
        None => Ok(Json(serde_json::json!({
            "ssl_valid": null,
            "ssl_expires_at": null,
            "checked_at": null,
        }))),
    }
}
