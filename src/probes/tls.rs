use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct SslInfo {
    pub valid: bool,
    pub expires_at: Option<String>,
    pub error: Option<String>,
}

fn client_config() -> Arc<rustls::ClientConfig> {
    let mut roots = rustls::RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for cert in native.certs {
        let _ = roots.add(cert);
    }
    Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

/// Connects to `host:443`, completes a TLS handshake, and inspects the leaf certificate's
/// validity window. Used both inline by the HTTP probe (when `check_ssl` is set) and
/// standalone by the SSL check job.
pub async fn probe_tls(host: &str, port: u16, timeout_dur: Duration) -> SslInfo {
    let connect = async {
        let tcp = TcpStream::connect((host, port)).await?;
        let config = client_config();
        let connector = tokio_rustls::TlsConnector::from(config);
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad server name"))?;
        let tls_stream = connector.connect(server_name, tcp).await?;
        let (_, conn) = tls_stream.get_ref();
        let certs = conn.peer_certificates().map(|c| c.to_vec()).unwrap_or_default();
        Ok::<_, std::io::Error>(certs)
    };

    let result = timeout(timeout_dur, connect).await;

    match result {
        Err(_) => SslInfo {
            valid: false,
            expires_at: None,
            error: Some("TLS handshake timed out".to_string()),
        },
        Ok(Err(e)) => SslInfo {
            valid: false,
            expires_at: None,
            error: Some(format!("TLS handshake failed: {e}")),
        },
        Ok(Ok(certs)) => match certs.first() {
            None => SslInfo {
                valid: false,
                expires_at: None,
                error: Some("server presented no certificate".to_string()),
            },
            Some(leaf) => parse_leaf_certificate(leaf.as_ref()),
        },
    }
}

fn parse_leaf_certificate(der: &[u8]) -> SslInfo {
    match x509_parser::parse_x509_certificate(der) {
        Ok((_, cert)) => {
            let validity = cert.validity();
            let now = x509_parser::time::ASN1Time::now();
            let valid = now >= validity.not_before && now <= validity.not_after;
            SslInfo {
                valid,
                expires_at: Some(validity.not_after.to_rfc2822().unwrap_or_default()),
                error: if valid {
                    None
                } else {
                    Some("certificate is outside its validity window".to_string())
                },
            }
        }
        Err(e) => SslInfo {
            valid: false,
            expires_at: None,
            error: Some(format!("could not parse certificate: {e}")),
        },
    }
}

/// Extracts host from a URL string and probes TLS on port 443. Used inline by the HTTP
/// probe; parse failures degrade to no SSL info rather than failing the whole probe.
pub async fn inspect_tls_for_url(target: &str, timeout_dur: Duration) -> Option<SslInfo> {
    let url = url::Url::parse(target).ok()?;
    if url.scheme() != "https" {
        return None;
    }
    let host = url.host_str()?.to_string();
    let port = url.port_or_known_default().unwrap_or(443);
    Some(probe_tls(&host, port, timeout_dur).await)
}
