use std::time::Duration;

use crate::models::AlertChannel;
use crate::ssrf;

use super::NotificationPayload;

const DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);
const COLOR_OPEN: u32 = 0xFF0000;
const COLOR_RESOLVED: u32 = 0x00FF00;

pub async fn send_discord(channel: &AlertChannel, payload: &NotificationPayload) -> Result<(), String> {
    let url = channel
        .config
        .get("url")
        .or_else(|| channel.config.get("webhook_url"))
        .ok_or_else(|| "discord channel missing config.url".to_string())?;

    if !url.starts_with("https://discord.com/") && !url.starts_with("http://discord.com/") {
        return Err("discord channel url must target discord.com".to_string());
    }
    ssrf::check_webhook_url(url).await?;

    let color = if payload.status == "resolved" { COLOR_RESOLVED } else { COLOR_OPEN };
    let body = serde_json::json!({
        "embeds": [{
            "title": format!("{} — {}", payload.monitor_name, payload.status),
            "color": color,
            "description": payload.message,
            "fields": [
                { "name": "Target", "value": payload.monitor_target, "inline": true },
                { "name": "Timestamp", "value": payload.timestamp, "inline": true },
            ],
        }]
    });

    let client = reqwest::Client::builder()
        .timeout(DISPATCH_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())?;

    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("discord webhook returned status {}", response.status()));
    }
    Ok(())
}
