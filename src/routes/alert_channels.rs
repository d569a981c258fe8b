use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, State};

use crate::auth::AuthUser;
use crate::db::Db;
use crate::error::{AppError, ErrorBody};
use crate::models::{AlertChannel, ChannelType, CreateAlertChannel};
use crate::ssrf;
use crate::store::AlertChannelRepo;

use super::bad_request;

async fn validate_create(input: &CreateAlertChannel) -> Result<(), (Status, Json<ErrorBody>)> {
    let channel_type = ChannelType::parse(&input.channel_type)
        .ok_or_else(|| bad_request("channel_type must be one of: webhook, discord, email"))?;

    match channel_type {
        ChannelType::Webhook => {
            let url = input
                .config
                .get("url")
                .ok_or_else(|| bad_request("webhook channel requires config.url"))?;
            ssrf::check_webhook_url(url)
                .await
                .map_err(bad_request)?;
        }
        ChannelType::Discord => {
            let url = input
                .config
                .get("url")
                .or_else(|| input.config.get("webhook_url"))
                .ok_or_else(|| bad_request("discord channel requires config.url"))?;
            if !url.starts_with("https://discord.com/") && !url.starts_with("http://discord.com/") {
                return Err(bad_request("discord channel url must target discord.com"));
            }
            ssrf::check_webhook_url(url)
                .await
                .map_err(bad_request)?;
        }
        ChannelType::Email => {
            let to = input
                .config
                .get("to")
                .ok_or_else(|| bad_request("email channel requires config.to"))?;
            if !to.contains('@') {
                return Err(bad_request("config.to is not a valid email address"));
            }
        }
    }
    Ok(())
}

#[post("/alert-channels", format = "json", data = "<input>")]
pub async fn create_alert_channel(
    auth: AuthUser,
    input: Json<CreateAlertChannel>,
    db: &State<Arc<Db>>,
) -> Result<Json<AlertChannel>, (Status, Json<ErrorBody>)> {
    let input = input.into_inner();
    validate_create(&input).await?;
    let conn = db.conn.lock().unwrap();
    let channel = AlertChannelRepo::create(&conn, &auth.tenant_id, &input).map_err(AppError::into_response)?;
    Ok(Json(channel))
}

#[get("/alert-channels")]
pub fn list_alert_channels(
    auth: AuthUser,
    db: &State<Arc<Db>>,
) -> Result<Json<Vec<AlertChannel>>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let channels = AlertChannelRepo::list(&conn, &auth.tenant_id).map_err(AppError::into_response)?;
    Ok(Json(channels))
}

#[get("/alert-channels/<id>")]
pub fn get_alert_channel(
    auth: AuthUser,
    id: &str,
    db: &State<Arc<Db>>,
) -> Result<Json<AlertChannel>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let channel = AlertChannelRepo::get(&conn, &auth.tenant_id, id).map_err(AppError::into_response)?;
    Ok(Json(channel))
}

#[delete("/alert-channels/<id>")]
pub fn delete_alert_channel(
    auth: AuthUser,
    id: &str,
    db: &State<Arc<Db>>,
) -> Result<Json<serde_json::Value>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    AlertChannelRepo::delete(&conn, &auth.tenant_id, id).map_err(AppError::into_response)?;
    Ok(Json(serde_json::json!({"message": "alert channel deleted"})))
}
