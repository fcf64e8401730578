use std::future::Future;

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::candidate::Candidate;
use crate::config::BackendConfig;
use crate::diagnosis::{DiagnosisRecord, DiagnosisTarget};
use crate::error::BackendError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The aggregation API as seen by the resolution controller.
pub trait Backend {
    /// `GET /search?q=<query>`: candidates in backend order, possibly empty.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Candidate>, BackendError>> + Send;

    /// `GET /diagnosis/<username>[?ip=<node ip>]`.
    fn diagnosis(
        &self,
        target: &DiagnosisTarget,
    ) -> impl Future<Output = Result<DiagnosisRecord, BackendError>> + Send;
}

/// [`Backend`] over HTTP, authenticated with the `x-api-key` header.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: BackendConfig,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn search_url(&self, query: &str) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&["search"])?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    /// The username is pushed as a single, percent-encoded path segment.
    pub fn diagnosis_url(&self, target: &DiagnosisTarget) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&["diagnosis", target.username.as_str()])?;
        if let Some(ip) = &target.node_ip {
            url.query_pairs_mut().append_pair("ip", ip);
        }
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.config.base_url().clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.config.base_url().to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        tracing::debug!(path = url.path(), "backend request");

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, self.config.api_key())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl Backend for HttpBackend {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, BackendError> {
        let url = self.search_url(query)?;
        self.get_json(url).await
    }

    async fn diagnosis(&self, target: &DiagnosisTarget) -> Result<DiagnosisRecord, BackendError> {
        let url = self.diagnosis_url(target)?;
        self.get_json(url).await
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::{API_KEY_HEADER, Backend, HttpBackend};
    use crate::config::BackendConfig;
    use crate::diagnosis::{DiagnosisTarget, Scalar};
    use crate::error::BackendError;

    const TEST_KEY: &str = "test-key";

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == TEST_KEY)
    }

    async fn search(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        match params.get("q").map(String::as_str) {
            Some("Perez") => Json(json!([
                { "pppoe": "jperez01", "nombre": "Juan Perez", "direccion": "Calle 1", "origen": "ispcube", "nodo_ip": "10.0.0.1" },
                { "pppoe": "jperez01", "nombre": "Juan Perez", "direccion": "Calle 1", "origen": "smartolt", "nodo_ip": "10.0.0.2" }
            ]))
            .into_response(),
            Some("broken") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            Some("garbage") => "not json".into_response(),
            _ => Json(json!([])).into_response(),
        }
    }

    async fn diagnosis(
        headers: HeaderMap,
        Path(username): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        match username.as_str() {
            "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({})).into_response()
            }
            _ => Json(json!({
                "pppoe_username": username,
                "nodo_ip": params.get("ip"),
                "mikrotik": { "active": true }
            }))
            .into_response(),
        }
    }

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route("/api/search", get(search))
            .route("/api/diagnosis/{username}", get(diagnosis));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test backend should run");
        });
        format!("http://{addr}/api/")
    }

    fn backend(base_url: &str, api_key: &str) -> HttpBackend {
        let config = BackendConfig::new(base_url, api_key)
            .expect("config should be valid")
            .with_timeout(Duration::from_millis(300));
        HttpBackend::new(config).expect("client should build")
    }

    #[test]
    fn urls_encode_query_and_username() {
        let backend = backend("https://noc.example.net/api/", TEST_KEY);

        let url = backend.search_url("Juan Perez & Co").expect("search url");
        assert_eq!(
            url.as_str(),
            "https://noc.example.net/api/search?q=Juan+Perez+%26+Co"
        );

        let url = backend
            .diagnosis_url(&DiagnosisTarget::new("juan/perez 01", None))
            .expect("diagnosis url");
        assert_eq!(
            url.as_str(),
            "https://noc.example.net/api/diagnosis/juan%2Fperez%2001"
        );

        let url = backend
            .diagnosis_url(&DiagnosisTarget::new(
                "jperez01",
                Some("10.0.0.2".to_string()),
            ))
            .expect("diagnosis url");
        assert_eq!(
            url.as_str(),
            "https://noc.example.net/api/diagnosis/jperez01?ip=10.0.0.2"
        );
    }

    #[tokio::test]
    async fn search_returns_candidates_in_backend_order() {
        let base = spawn_backend().await;
        let candidates = backend(&base, TEST_KEY)
            .search("Perez")
            .await
            .expect("search should succeed");

        let ips: Vec<_> = candidates.iter().map(|c| c.node_ip.as_deref()).collect();
        assert_eq!(ips, vec![Some("10.0.0.1"), Some("10.0.0.2")]);
    }

    #[tokio::test]
    async fn search_returns_empty_list_without_error() {
        let base = spawn_backend().await;
        let candidates = backend(&base, TEST_KEY)
            .search("Juan Perez")
            .await
            .expect("search should succeed");
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn requests_carry_the_api_key() {
        let base = spawn_backend().await;
        let err = backend(&base, "wrong-key")
            .search("Perez")
            .await
            .expect_err("search should be rejected");
        assert_eq!(err, BackendError::Status { status: 401 });
    }

    #[tokio::test]
    async fn non_success_and_malformed_responses_are_errors() {
        let base = spawn_backend().await;
        let backend = backend(&base, TEST_KEY);

        assert_eq!(
            backend.search("broken").await.expect_err("500 should fail"),
            BackendError::Status { status: 500 }
        );
        assert!(matches!(
            backend.search("garbage").await,
            Err(BackendError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn diagnosis_passes_node_ip_and_decodes_record() {
        let base = spawn_backend().await;
        let record = backend(&base, TEST_KEY)
            .diagnosis(&DiagnosisTarget::new(
                "jperez 01",
                Some("10.0.0.2".to_string()),
            ))
            .await
            .expect("diagnosis should succeed");

        assert_eq!(record.username.as_deref(), Some("jperez 01"));
        assert_eq!(record.node_ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(record.session_active(), Some(&Scalar::Flag(true)));
    }

    #[tokio::test]
    async fn diagnosis_times_out() {
        let base = spawn_backend().await;
        let err = backend(&base, TEST_KEY)
            .diagnosis(&DiagnosisTarget::new("slow", None))
            .await
            .expect_err("slow diagnosis should time out");
        assert_eq!(err, BackendError::Timeout);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");
        drop(listener);

        let err = backend(&format!("http://{addr}"), TEST_KEY)
            .search("Perez")
            .await
            .expect_err("closed port should fail");
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
