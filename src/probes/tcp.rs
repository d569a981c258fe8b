use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::timeout;

use super::ProbeResult;

/// Dials `target` (a `host:port` string) and immediately closes the connection. No
/// payload is exchanged — success means the three-way handshake completed.
pub async fn probe_tcp(target: &str, dial_timeout: Duration) -> ProbeResult {
    let start = Instant::now();

    match timeout(dial_timeout, TcpStream::connect(target)).await {
        Ok(Ok(stream)) => {
            drop(stream);
            ProbeResult {
                success: true,
                latency_ms: elapsed_ms(start),
                status_code: None,
                error: None,
                ssl: None,
            }
        }
        Ok(Err(e)) => ProbeResult {
            success: false,
            latency_ms: elapsed_ms(start),
            status_code: None,
            error: Some(format!("connection failed: {e}")),
            ssl: None,
        },
        Err(_) => ProbeResult {
            success: false,
            latency_ms: elapsed_ms(start),
            status_code: None,
            error: Some("connection timed out".to_string()),
            ssl: None,
        },
    }
}

fn elapsed_ms(start: Instant) -> u32 {
    start.elapsed().as_millis().min(u32::MAX as u128) as u32
}
