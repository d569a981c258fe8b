use std::time::{Duration, Instant};

use surge_ping::{Client, Config as PingConfig, PingIdentifier, PingSequence, ICMP};
use tokio::time::timeout;

use super::ProbeResult;

/// Resolves `target` and sends a single ICMP echo, using `surge-ping`'s unprivileged
/// (SOCK_DGRAM) mode so the worker process does not need CAP_NET_RAW.
pub async fn probe_icmp(target: &str, ping_timeout: Duration) -> ProbeResult {
    let start = Instant::now();

    let addr = match tokio::net::lookup_host((target, 0)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr.ip(),
            None => {
                return ProbeResult {
                    success: false,
                    latency_ms: elapsed_ms(start),
                    status_code: None,
                    error: Some(format!("{target} did not resolve to any address")),
                    ssl: None,
                }
            }
        },
        Err(e) => {
            return ProbeResult {
                success: false,
                latency_ms: elapsed_ms(start),
                status_code: None,
                error: Some(format!("DNS resolution failed: {e}")),
                ssl: None,
            }
        }
    };

    let config = if addr.is_ipv4() {
        PingConfig::builder().kind(ICMP::V4).build()
    } else {
        PingConfig::builder().kind(ICMP::V6).build()
    };

    let client = match Client::new(&config) {
        Ok(c) => c,
        Err(e) => {
            return ProbeResult {
                success: false,
                latency_ms: elapsed_ms(start),
                status_code: None,
                error: Some(format!("could not create ICMP client: {e}")),
                ssl: None,
            }
        }
    };

    let payload = [0u8; 32];
    let mut pinger = client
        .pinger(addr, PingIdentifier(rand::random()))
        .await;

    match timeout(ping_timeout, pinger.ping(PingSequence(0), &payload)).await {
        Ok(Ok(_)) => ProbeResult {
            success: true,
            latency_ms: elapsed_ms(start),
            status_code: None,
            error: None,
            ssl: None,
        },
        Ok(Err(e)) => ProbeResult {
            success: false,
            latency_ms: elapsed_ms(start),
            status_code: None,
            error: Some(format!("ICMP echo failed: {e}")),
            ssl: None,
        },
        Err(_) => ProbeResult {
            success: false,
            latency_ms: elapsed_ms(start),
            status_code: None,
            error: Some("ICMP echo timed out".to_string()),
            ssl: None,
        },
    }
}

fn elapsed_ms(start: Instant) -> u32 {
    start.elapsed().as_millis().min(u32::MAX as u128) as u32
}
