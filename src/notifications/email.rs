use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;
use crate::models::AlertChannel;
use crate::ssrf;

use super::NotificationPayload;

pub async fn send_email(
    config: &Config,
    channel: &AlertChannel,
    payload: &NotificationPayload,
) -> Result<(), String> {
    let to = channel
        .config
        .get("to")
        .ok_or_else(|| "email channel missing config.to".to_string())?;

    let host = config
        .smtp_host
        .as_deref()
        .ok_or_else(|| "SMTP_HOST is not configured".to_string())?;
    ssrf::check_host(host).await?;

    let from = config
        .smtp_from
        .as_deref()
        .ok_or_else(|| "SMTP_FROM is not configured".to_string())?;

    let subject = format!("[{}] {} — {}", payload.status, payload.monitor_name, payload.monitor_target);
    let body = format!(
        "{}\n\nIncident: {}\nTimestamp: {}\n",
        payload.message, payload.incident_id, payload.timestamp
    );

    let email = Message::builder()
        .from(from.parse().map_err(|e| format!("invalid SMTP_FROM: {e}"))?)
        .to(to.parse().map_err(|e| format!("invalid recipient address: {e}"))?)
        .subject(subject)
        .body(body)
        .map_err(|e| e.to_string())?;

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        .map_err(|e| e.to_string())?
        .port(config.smtp_port);

    if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    let mailer = builder.build();
    mailer.send(email).await.map_err(|e| e.to_string())?;
    Ok(())
}
