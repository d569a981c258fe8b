mod http;
mod icmp;
mod tcp;
mod tls;

pub use http::probe_http;
pub use icmp::probe_icmp;
pub use tcp::probe_tcp;
pub use tls::{probe_tls, SslInfo};

/// Outcome of a single probe execution, independent of protocol.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub success: bool,
    pub latency_ms: u32,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub ssl: Option<SslInfo>,
}
