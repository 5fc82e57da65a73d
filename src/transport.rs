//! Delivery of serialized payloads to the collector.
//!
//! The dispatch worker is the only caller; producers never touch the
//! transport. Any timeout policy belongs to the transport itself (the core
//! imposes none), which is why [`HttpTransport::with_timeout`] exists.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::error::{BuildError, TransportError};

/// Performs the blocking network call for one invocation.
///
/// Implementations signal failure through [`TransportError`]; the core
/// treats every failure identically (rate-gated log, event dropped).
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// POSTs `body` to `path` on the collector.
    async fn post(&self, path: &str, body: String) -> Result<(), TransportError>;
}

/// HTTP transport POSTing JSON documents to a collector endpoint.
///
/// The endpoint is `scheme://host[:port]`; request paths are absolute and
/// replace any path component of the endpoint, as the collector's routes are
/// rooted.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport for the given endpoint, with no request timeout.
    pub fn new(endpoint: &str) -> Result<Self, BuildError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BuildError::HttpClient { reason: e.to_string() })?;
        Self::with_client(endpoint, client)
    }

    /// Creates a transport that gives up on requests after `timeout`.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, BuildError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BuildError::HttpClient { reason: e.to_string() })?;
        Self::with_client(endpoint, client)
    }

    fn with_client(endpoint: &str, client: reqwest::Client) -> Result<Self, BuildError> {
        let base = Url::parse(endpoint).map_err(|e| BuildError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(BuildError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        if base.host_str().is_none() {
            return Err(BuildError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "missing host".to_string(),
            });
        }
        Ok(Self { base, client })
    }

    /// The endpoint this transport posts to.
    pub fn endpoint(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, path: &str, body: String) -> Result<(), TransportError> {
        let url = self.base.join(path).map_err(|e| TransportError::Path {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status { status: status.as_u16(), path: path.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP stub: accepts a single request, answers with
    /// `status_line`, and hands back the raw request it saw.
    async fn spawn_stub(
        status_line: &'static str,
    ) -> (std::net::SocketAddr, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                if n == 0 || raw.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let header_end = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
            let headers = String::from_utf8_lossy(&raw[..header_end]).to_string();
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.trim().eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            while raw.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn posts_json_body_to_event_path() {
        let (addr, handle) = spawn_stub("204 No Content").await;
        let transport = HttpTransport::new(&format!("http://{addr}")).unwrap();

        transport.post("/event", "{\"k\":1}".to_string()).await.unwrap();

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /event HTTP/1.1"), "got: {request}");
        assert!(request.ends_with("{\"k\":1}"), "got: {request}");
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_status_error() {
        let (addr, handle) = spawn_stub("500 Internal Server Error").await;
        let transport = HttpTransport::new(&format!("http://{addr}")).unwrap();

        let err = transport.post("/event", "{}".to_string()).await.unwrap_err();
        match err {
            TransportError::Status { status, path } => {
                assert_eq!(status, 500);
                assert_eq!(path, "/event");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
        let _ = handle.await;
    }

    #[tokio::test]
    async fn connection_refused_maps_to_http_error() {
        // bind then drop to get a port nothing is listening on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&format!("http://{addr}")).unwrap();
        let err = transport.post("/event", "{}".to_string()).await.unwrap_err();
        assert!(matches!(err, TransportError::Http(_)), "got {err:?}");
    }

    #[test]
    fn rejects_unusable_endpoints() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(BuildError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            HttpTransport::new("ftp://collector.example.com"),
            Err(BuildError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            HttpTransport::new("http://"),
            Err(BuildError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn accepts_host_port_endpoints() {
        let transport = HttpTransport::new("http://collector.example.com:9090").unwrap();
        assert_eq!(transport.endpoint().as_str(), "http://collector.example.com:9090/");
    }
}
