mod discord;
mod email;
mod webhook;

pub use discord::send_discord;
pub use email::send_email;
pub use webhook::send_webhook;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub incident_id: String,
    pub monitor_name: String,
    pub monitor_target: String,
    pub status: String,
    pub message: String,
    pub timestamp: String,
}
