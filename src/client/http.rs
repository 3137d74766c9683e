//! reqwest-backed [`SessionClient`].

use super::{ClientError, SessionClient, SessionResponse};
use crate::config::SessionSyncConfig;
use crate::env::endpoints;
use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpSessionClient {
    pub fn new(config: &SessionSyncConfig) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(&config.base_url)?;
        // keep any path prefix when joining endpoint paths
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.session_token {
            let cookie = format!("{}={}", endpoints::SESSION_COOKIE_NAME, token);
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| ClientError::Configuration(format!("invalid session token: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path against the base URL
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    async fn fetch_current_user(&self) -> Result<SessionResponse, ClientError> {
        let url = self.url(endpoints::USER)?;
        debug!("GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::MalformedBody(format!("status {status}: {e}")))?;

        debug!("GET {} -> {}", endpoints::USER, status);
        Ok(SessionResponse {
            status,
            body,
            headers,
        })
    }

    async fn delete_session(&self) -> Result<u16, ClientError> {
        let url = self.url(endpoints::SESSIONS)?;
        debug!("DELETE {}", url);

        let response = self.http.delete(url).send().await?;
        let status = response.status().as_u16();

        debug!("DELETE {} -> {}", endpoints::SESSIONS, status);
        Ok(status)
    }

    fn client_type(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn config_with_base(base_url: &str) -> SessionSyncConfig {
        SessionSyncConfig {
            base_url: base_url.to_string(),
            ..SessionSyncConfig::default()
        }
    }

    /// Serve one canned HTTP response on a local port. The handle yields the raw
    /// request head that was received.
    async fn serve_once(
        status: u16,
        headers: &[(&str, &str)],
        body: &str,
    ) -> (SessionSyncConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut response = format!(
            "HTTP/1.1 {} Canned\r\nContent-Length: {}\r\nConnection: close\r\n",
            status,
            body.len()
        );
        for (name, value) in headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }
        response.push_str("\r\n");
        response.push_str(body);

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        let mut config = config_with_base(&format!("http://{}", addr));
        config.request_timeout_secs = 5;
        (config, server)
    }

    #[test]
    fn test_endpoint_urls() {
        let client = HttpSessionClient::new(&config_with_base("https://example.com")).unwrap();
        assert_eq!(
            client.url(endpoints::USER).unwrap().as_str(),
            "https://example.com/api/v1/user"
        );
        assert_eq!(
            client.url(endpoints::SESSIONS).unwrap().as_str(),
            "https://example.com/api/v1/sessions"
        );
    }

    #[test]
    fn test_base_url_prefix_is_kept() {
        let client = HttpSessionClient::new(&config_with_base("https://example.com/app")).unwrap();
        assert_eq!(
            client.url(endpoints::USER).unwrap().as_str(),
            "https://example.com/app/api/v1/user"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpSessionClient::new(&config_with_base("not a url"));
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        let mut config = config_with_base("http://127.0.0.1:9");
        config.request_timeout_secs = 2;
        let client = HttpSessionClient::new(&config).unwrap();

        let result = client.fetch_current_user().await;
        assert!(matches!(
            result,
            Err(ClientError::Network(_)) | Err(ClientError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_rejection_is_returned_as_response_with_headers() {
        let (config, server) = serve_once(
            401,
            &[("Content-Type", "application/json"), ("X-Vercel-Id", "gru1::abc")],
            r#"{"message":"Usuário não encontrado."}"#,
        )
        .await;
        let client = HttpSessionClient::new(&config).unwrap();

        let response = client.fetch_current_user().await.unwrap();
        server.await.unwrap();

        assert_eq!(response.status, 401);
        assert!(response.is_auth_failure());
        assert!(response.has_header("x-vercel-id"));
        assert_eq!(response.header("x-vercel-id"), Some("gru1::abc"));
        assert_eq!(response.message(), Some("Usuário não encontrado."));
    }

    #[tokio::test]
    async fn test_proxy_style_rejection_has_no_platform_header() {
        let (config, server) = serve_once(403, &[], "{}").await;
        let client = HttpSessionClient::new(&config).unwrap();

        let response = client.fetch_current_user().await.unwrap();
        server.await.unwrap();

        assert_eq!(response.status, 403);
        assert!(!response.has_header("x-vercel-id"));
    }

    #[tokio::test]
    async fn test_server_error_is_not_a_transport_error() {
        let (config, server) = serve_once(500, &[], r#"{"message":"boom"}"#).await;
        let client = HttpSessionClient::new(&config).unwrap();

        let response = client.fetch_current_user().await.unwrap();
        server.await.unwrap();

        assert_eq!(response.status, 500);
        assert!(!response.is_auth_failure());
    }

    #[tokio::test]
    async fn test_user_request_sends_session_cookie() {
        let (mut config, server) = serve_once(
            200,
            &[("Content-Type", "application/json")],
            r#"{"id":"1","username":"ana"}"#,
        )
        .await;
        config.session_token = Some("abc123".to_string());
        let client = HttpSessionClient::new(&config).unwrap();

        let response = client.fetch_current_user().await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body["username"], "ana");
        assert!(request.starts_with("GET /api/v1/user HTTP/1.1"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("cookie: session_id=abc123"),
            "request was: {}",
            request
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let (config, server) = serve_once(
            502,
            &[("Content-Type", "text/html")],
            "<html>Bad Gateway</html>",
        )
        .await;
        let client = HttpSessionClient::new(&config).unwrap();

        let result = client.fetch_current_user().await;
        server.await.unwrap();

        assert!(matches!(result, Err(ClientError::MalformedBody(_))));
    }

    #[tokio::test]
    async fn test_delete_session_returns_raw_status() {
        let (config, server) = serve_once(403, &[], "").await;
        let client = HttpSessionClient::new(&config).unwrap();

        let status = client.delete_session().await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(status, 403);
        assert!(request.starts_with("DELETE /api/v1/sessions HTTP/1.1"));
    }
}
