use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use crate::auth::AuthUser;
use crate::db::Db;
use crate::error::{AppError, ErrorBody};
use crate::models::{AlertRule, CreateAlertRule, TriggerType, UpdateAlertRule};
use crate::store::AlertRuleRepo;

use super::bad_request;

fn validate_create(input: &CreateAlertRule) -> Result<(), (Status, Json<ErrorBody>)> {
    let trigger = TriggerType::parse(&input.trigger_type)
        .ok_or_else(|| bad_request("trigger_type must be one of: down, slow_response, ssl_expiry"))?;
    if input.threshold_value < trigger.min_threshold() {
        return Err(bad_request(format!(
            "threshold_value must be at least {} for trigger_type {}",
            trigger.min_threshold(),
            trigger.as_str()
        )));
    }
    Ok(())
}

#[post("/alert-rules", format = "json", data = "<input>")]
pub fn create_alert_rule(
    auth: AuthUser,
    input: Json<CreateAlertRule>,
    db: &State<Arc<Db>>,
) -> Result<Json<AlertRule>, (Status, Json<ErrorBody>)> {
    let input = input.into_inner();
    validate_create(&input)?;
    let conn = db.conn.lock().unwrap();
    let rule = AlertRuleRepo::create(&conn, &auth.tenant_id, &input).map_err(AppError::into_response)?;
    Ok(Json(rule))
}

#[get("/alert-rules")]
pub fn list_alert_rules(
    auth: AuthUser,
    db: &State<Arc<Db>>,
) -> Result<Json<Vec<AlertRule>>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let rules = AlertRuleRepo::list(&conn, &auth.tenant_id).map_err(AppError::into_response)?;
    Ok(Json(rules))
}

#[get("/alert-rules/<id>")]
pub fn get_alert_rule(
    auth: AuthUser,
    id: &str,
    db: &State<Arc<Db>>,
) -> Result<Json<AlertRule>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let rule = AlertRuleRepo::get(&conn, &auth.tenant_id, id).map_err(AppError::into_response)?;
    Ok(Json(rule))
}

#[patch("/alert-rules/<id>", format = "json", data = "<input>")]
pub fn update_alert_rule(
    auth: AuthUser,
    id: &str,
    input: Json<UpdateAlertRule>,
    db: &State<Arc<Db>>,
) -> Result<Json<AlertRule>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let rule = AlertRuleRepo::update(&conn, &auth.tenant_id, id, &input.into_inner())
        .map_err(AppError::into_response)?;
    Ok(Json(rule))
}

#[delete("/alert-rules/<id>")]
pub fn delete_alert_rule(
    auth: AuthUser,
    id: &str,
    db: &State<Arc<Db>>,
) -> Result<Json<serde_json::Value>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    AlertRuleRepo::delete(&conn, &auth.tenant_id, id).map_err(AppError::into_response)?;
    Ok(Json(serde_json::json!({"message": "alert rule deleted"})))
}
