use std::net::IpAddr;
use url::Url;

/// Rejects any outbound notification target whose resolved address is not a routable
/// public address, or whose scheme is not http(s). Applied once at channel-creation time
/// (API) and again, authoritatively, at dispatch time (worker), since DNS can change
/// between the two.
pub async fn check_webhook_url(url_str: &str) -> Result<(), String> {
    let url = Url::parse(url_str).map_err(|_| "invalid URL".to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme: {other}")),
    }
    let host = url.host_str().ok_or_else(|| "URL has no host".to_string())?;
    check_host(host).await
}

pub async fn check_host(host: &str) -> Result<(), String> {
    let addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| format!("could not resolve host: {e}"))?;

    let mut any = false;
    for addr in addrs {
        any = true;
        if is_blocked_ip(&addr.ip()) {
            return Err(format!("host {host} resolves to a disallowed address"));
        }
    }
    if !any {
        return Err(format!("host {host} did not resolve to any address"));
    }
    Ok(())
}

/// True for loopback, link-local, private (RFC1918), CGNAT, reserved, and multicast
/// addresses — the SSRF-sensitive ranges a monitoring service must never let a tenant
/// point a notification channel at.
pub fn is_blocked_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_link_local()
                || v4.is_private()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || is_cgnat(v4)
                || is_reserved_v4(v4)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // unique local (fc00::/7)
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // link-local
        }
    }
}

fn is_cgnat(v4: &std::net::Ipv4Addr) -> bool {
    let octets = v4.octets();
    octets[0] == 100 && (octets[1] & 0b1100_0000) == 64
}

fn is_reserved_v4(v4: &std::net::Ipv4Addr) -> bool {
    let octets = v4.octets();
    octets[0] == 0 || octets[0] >= 240
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn blocks_loopback_and_private() {
        assert!(is_blocked_ip(&IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(is_blocked_ip(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))));
        assert!(is_blocked_ip(&IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))));
        assert!(is_blocked_ip(&IpAddr::V4(Ipv4Addr::new(169, 254, 1, 1))));
        assert!(is_blocked_ip(&IpAddr::V4(Ipv4Addr::new(100, 64, 0, 1))));
    }

    #[test]
    fn allows_public() {
        assert!(!is_blocked_ip(&IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))));
    }
}
