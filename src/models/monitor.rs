use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorType {
    Http,
    Tcp,
    Icmp,
}

impl MonitorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorType::Http => "http",
            MonitorType::Tcp => "tcp",
            MonitorType::Icmp => "icmp",
        }
    }

    pub fn parse(s: &str) -> Option<MonitorType> {
        match s {
            "http" => Some(MonitorType::Http),
            "tcp" => Some(MonitorType::Tcp),
            "icmp" => Some(MonitorType::Icmp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub target: String,
    pub monitor_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub check_interval_seconds: u32,
    pub timeout_seconds: u32,
    pub enabled: bool,
    pub check_ssl: bool,
    pub ssl_alert_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn default_timeout() -> u32 {
    30
}

fn default_ssl_alert_days() -> u32 {
    14
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMonitor {
    pub name: String,
    pub target: String,
    pub monitor_type: String,
    #[serde(default)]
    pub keyword: Option<String>,
    pub check_interval_seconds: u32,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default)]
    pub check_ssl: bool,
    #[serde(default = "default_ssl_alert_days")]
    pub ssl_alert_days: u32,
}

/// Distinguishes "field absent" from "field explicitly set to null" so PATCH can clear an
/// optional column without a separate clear-flag in the request body.
fn deserialize_optional_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMonitor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub check_interval_seconds: Option<u32>,
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub check_ssl: Option<bool>,
    #[serde(default)]
    pub ssl_alert_days: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub keyword: Option<Option<String>>,
}
