//! Remote data sources
//!
//! The loader only needs "give me the raw payload for this status". The
//! HTTP implementation talks to the spreadsheet-backed endpoint; the static
//! and disabled sources cover offline hosts and tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::LoaderConfig;
use crate::{Error, Result};

/// A source of raw restaurant records
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the raw payload for a status partition.
    ///
    /// The payload is returned as parsed JSON without any shape check;
    /// deciding what a non-array payload means is the loader's job.
    async fn fetch(&self, status: &str) -> Result<Value>;
}

// ── HTTP ──────────────────────────────────────────────────

/// Fetches records from the Apps Script endpoint over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpSource {
    /// Build a source from loader configuration
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("gfdir/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(HttpSource {
            client,
            endpoint: config.endpoint_url()?,
            timeout: config.timeout,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Network(err.to_string())
        }
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch(&self, status: &str) -> Result<Value> {
        let url = request_url(&self.endpoint, status, unix_millis());
        debug!(%url, "fetching remote restaurants");

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let code = response.status();
        if !code.is_success() {
            return Err(Error::Status(code.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(|e| Error::MalformedBody(e.to_string()))
    }
}

/// Request URL for one fetch: the endpoint plus `status` and a
/// cache-defeating `_` parameter
pub fn request_url(endpoint: &Url, status: &str, now_millis: u128) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("status", status)
        .append_pair("_", &now_millis.to_string());
    url
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

// ── Offline sources ───────────────────────────────────────

/// Serves a fixed payload, whatever the requested status
#[derive(Debug, Clone)]
pub struct StaticSource {
    payload: Value,
}

impl StaticSource {
    pub fn new(payload: Value) -> Self {
        StaticSource { payload }
    }
}

#[async_trait]
impl RemoteSource for StaticSource {
    async fn fetch(&self, _status: &str) -> Result<Value> {
        Ok(self.payload.clone())
    }
}

/// Always fails; every refresh cycle falls back to the baseline
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSource;

#[async_trait]
impl RemoteSource for DisabledSource {
    async fn fetch(&self, _status: &str) -> Result<Value> {
        Err(Error::Network("remote source disabled".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve a single canned response; the handle yields the raw request head
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/exec", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_head(&mut socket).await;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            head
        });
        (endpoint, handle)
    }

    async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn source_for(endpoint: &str, timeout: Duration) -> HttpSource {
        HttpSource::new(&LoaderConfig {
            endpoint: endpoint.to_string(),
            status: "approved".into(),
            timeout,
        })
        .unwrap()
    }

    #[test]
    fn test_request_url_carries_status_and_cache_buster() {
        let endpoint = Url::parse("https://script.example/exec").unwrap();
        let url = request_url(&endpoint, "approved", 1_700_000_000_123);
        assert_eq!(
            url.as_str(),
            "https://script.example/exec?status=approved&_=1700000000123"
        );
    }

    #[test]
    fn test_request_url_encodes_status() {
        let endpoint = Url::parse("https://script.example/exec").unwrap();
        let url = request_url(&endpoint, "en attente", 1);
        assert_eq!(url.query(), Some("status=en+attente&_=1"));
    }

    #[tokio::test]
    async fn test_http_fetch_success() {
        let (endpoint, server) = serve_once("HTTP/1.1 200 OK", r#"[{"id":"a","name":"A"}]"#).await;
        let payload = source_for(&endpoint, Duration::from_secs(5))
            .fetch("approved")
            .await
            .unwrap();
        assert_eq!(payload, json!([{"id": "a", "name": "A"}]));

        let head = server.await.unwrap();
        let request_line = head.lines().next().unwrap_or_default();
        assert!(request_line.starts_with("GET /exec?status=approved&_="));
        assert!(head.to_lowercase().contains("cache-control: no-store"));
    }

    #[tokio::test]
    async fn test_http_fetch_non_success_status() {
        let (endpoint, _server) = serve_once("HTTP/1.1 503 Service Unavailable", "{}").await;
        let err = source_for(&endpoint, Duration::from_secs(5))
            .fetch("approved")
            .await
            .unwrap_err();
        assert_eq!(err, Error::Status(503));
    }

    #[tokio::test]
    async fn test_http_fetch_malformed_body() {
        let (endpoint, _server) = serve_once("HTTP/1.1 200 OK", "<html>oops</html>").await;
        let err = source_for(&endpoint, Duration::from_secs(5))
            .fetch("approved")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_http_fetch_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/exec", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let timeout = Duration::from_millis(200);
        let err = source_for(&endpoint, timeout)
            .fetch("approved")
            .await
            .unwrap_err();
        assert_eq!(err, Error::Timeout(timeout));
    }

    #[tokio::test]
    async fn test_http_fetch_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/exec", listener.local_addr().unwrap());
        drop(listener);

        let err = source_for(&endpoint, Duration::from_secs(5))
            .fetch("approved")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_offline_sources() {
        let payload = StaticSource::new(json!([1])).fetch("any").await.unwrap();
        assert_eq!(payload, json!([1]));
        assert!(DisabledSource.fetch("approved").await.is_err());
    }
}
