use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub monitor_id: String,
    pub alert_rule_id: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    pub status: String,
    pub trigger_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_notified_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_notified_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub status: Option<String>,
    pub monitor_id: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}
