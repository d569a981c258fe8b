use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Down,
    SlowResponse,
    SslExpiry,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Down => "down",
            TriggerType::SlowResponse => "slow_response",
            TriggerType::SslExpiry => "ssl_expiry",
        }
    }

    pub fn parse(s: &str) -> Option<TriggerType> {
        match s {
            "down" => Some(TriggerType::Down),
            "slow_response" => Some(TriggerType::SlowResponse),
            "ssl_expiry" => Some(TriggerType::SslExpiry),
            _ => None,
        }
    }

    /// Minimum sane threshold per trigger type, per the rule's invariants.
    pub fn min_threshold(&self) -> i64 {
        match self {
            TriggerType::Down => 1,
            TriggerType::SlowResponse => 100,
            TriggerType::SslExpiry => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertRule {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<String>,
    pub trigger_type: String,
    pub threshold_value: i64,
    pub enabled: bool,
    pub created_at: String,
    pub channel_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlertRule {
    pub name: String,
    #[serde(default)]
    pub monitor_id: Option<String>,
    pub trigger_type: String,
    pub threshold_value: i64,
    #[serde(default)]
    pub channel_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAlertRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub threshold_value: Option<i64>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub channel_ids: Option<Vec<String>>,
}
