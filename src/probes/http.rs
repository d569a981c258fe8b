use std::time::{Duration, Instant};

use super::{tls::inspect_tls_for_url, ProbeResult};

const USER_AGENT: &str = "SentinelCheck-Monitor/1.0";
const BODY_READ_CAP: usize = 1024 * 1024;

/// Issues a GET against `target`, checks the final status code and optional body keyword,
/// and folds in a TLS inspection pass when `check_ssl` is set. Redirects are capped at 5;
/// a redirect cycle or overflow surfaces as a connect-class failure.
pub async fn probe_http(
    target: &str,
    keyword: Option<&str>,
    check_ssl: bool,
    timeout: Duration,
) -> ProbeResult {
    let start = Instant::now();

    let client = match reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return ProbeResult {
                success: false,
                latency_ms: elapsed_ms(start),
                status_code: None,
                error: Some(format!("client build failed: {e}")),
                ssl: None,
            }
        }
    };

    let ssl = if check_ssl {
        inspect_tls_for_url(target, timeout).await
    } else {
        None
    };

    let response = match client.get(target).send().await {
        Ok(resp) => resp,
        Err(e) => {
            let error = if e.is_timeout() {
                "request timed out".to_string()
            } else if e.is_connect() {
                format!("connection failed: {e}")
            } else {
                e.to_string()
            };
            return ProbeResult {
                success: false,
                latency_ms: elapsed_ms(start),
                status_code: None,
                error: Some(error),
                ssl,
            };
        }
    };

    let status = response.status();
    let status_code = Some(status.as_u16());

    if !status.is_success() {
        return ProbeResult {
            success: false,
            latency_ms: elapsed_ms(start),
            status_code,
            error: Some(format!("unexpected status code {}", status.as_u16())),
            ssl,
        };
    }

    if let Some(needle) = keyword {
        let body = match read_body_capped(response).await {
            Ok(body) => body,
            Err(e) => {
                return ProbeResult {
                    success: false,
                    latency_ms: elapsed_ms(start),
                    status_code,
                    error: Some(format!("failed to read response body: {e}")),
                    ssl,
                };
            }
        };
        if !body.contains(needle) {
            return ProbeResult {
                success: false,
                latency_ms: elapsed_ms(start),
                status_code,
                error: Some("response body did not contain expected keyword".to_string()),
                ssl,
            };
        }
    }

    ProbeResult {
        success: true,
        latency_ms: elapsed_ms(start),
        status_code,
        error: None,
        ssl,
    }
}

async fn read_body_capped(response: reqwest::Response) -> Result<String, reqwest::Error> {
    let bytes = response.bytes().await?;
    let capped = &bytes[..bytes.len().min(BODY_READ_CAP)];
    Ok(String::from_utf8_lossy(capped).into_owned())
}

fn elapsed_ms(start: Instant) -> u32 {
    start.elapsed().as_millis().min(u32::MAX as u128) as u32
}
