use std::time::Duration;

use crate::models::AlertChannel;
use crate::ssrf;

use super::NotificationPayload;

const DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fires a best-effort JSON POST at the channel's configured URL. The SSRF check here is
/// the authoritative boundary — DNS can change between channel creation and dispatch, so
/// this check runs fresh every time regardless of what the API validated at create time.
pub async fn send_webhook(channel: &AlertChannel, payload: &NotificationPayload) -> Result<(), String> {
    let url = channel
        .config
        .get("url")
        .ok_or_else(|| "webhook channel missing config.url".to_string())?;

    ssrf::check_webhook_url(url).await?;

    let client = reqwest::Client::builder()
        .timeout(DISPATCH_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())?;

    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("webhook returned status {}", response.status()));
    }
    Ok(())
}
