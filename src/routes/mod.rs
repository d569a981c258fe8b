mod alert_channels;
mod alert_rules;
mod auth_routes;
mod dashboard;
mod incidents;
mod monitors;
mod status_pages;
mod system;

pub use alert_channels::{create_alert_channel, delete_alert_channel, get_alert_channel, list_alert_channels};
pub use alert_rules::{create_alert_rule, delete_alert_rule, get_alert_rule, list_alert_rules, update_alert_rule};
pub use auth_routes::{login, me, register};
pub use dashboard::dashboard;
pub use incidents::list_incidents;
pub use monitors::{create_monitor, delete_monitor, get_monitor, get_monitor_checks, get_monitor_ssl_status, list_monitors, update_monitor};
pub use status_pages::status_page;
pub use system::health;

use rocket::http::Status;
use rocket::serde::json::Json;

use crate::error::ErrorBody;

pub(crate) fn not_found() -> (Status, Json<ErrorBody>) {
    (
        Status::NotFound,
        Json(ErrorBody {
            error: "Not found".to_string(),
            code: "NOT_FOUND".to_string(),
        }),
    )
}

pub(crate) fn bad_request(message: impl Into<String>) -> (Status, Json<ErrorBody>) {
    (
        Status::BadRequest,
        Json(ErrorBody {
            error: message.into(),
            code: "VALIDATION_ERROR".to_string(),
        }),
    )
}
