use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Webhook,
    Discord,
    Email,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Webhook => "webhook",
            ChannelType::Discord => "discord",
            ChannelType::Email => "email",
        }
    }

    pub fn parse(s: &str) -> Option<ChannelType> {
        match s {
            "webhook" => Some(ChannelType::Webhook),
            "discord" => Some(ChannelType::Discord),
            "email" => Some(ChannelType::Email),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertChannel {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub channel_type: String,
    pub config: HashMap<String, String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlertChannel {
    pub name: String,
    pub channel_type: String,
    pub config: HashMap<String, String>,
}
