use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorCheck {
    pub id: String,
    pub monitor_id: String,
    pub checked_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub response_time_ms: u32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_expires_at: Option<String>,
}
