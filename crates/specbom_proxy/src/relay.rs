use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use bom_logging::{bom_debug, bom_warn};
use url::Url;

use crate::ProxyError;

/// Route prefix the browser-facing client talks to.
pub const RELAY_PREFIX: &str = "/api/vertesia";
const OBJECT_SEGMENT_PREFIX: &str = "object-";

/// Upstream location plus the credential that never leaves this process.
#[derive(Clone)]
pub struct ProxyState {
    base: Url,
    api_key: Arc<str>,
    client: reqwest::Client,
}

impl std::fmt::Debug for ProxyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyState")
            .field("base", &self.base.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ProxyState {
    pub fn new(
        upstream_base: &str,
        api_key: &str,
        request_timeout: Option<Duration>,
    ) -> Result<Self, ProxyError> {
        if api_key.trim().is_empty() {
            return Err(ProxyError::MissingCredential);
        }
        let base = Url::parse(upstream_base.trim_end_matches('/'))
            .map_err(|err| ProxyError::InvalidBase(format!("{upstream_base}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(ProxyError::InvalidBase(upstream_base.to_string()));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ProxyError::Upstream(err.to_string()))?;
        Ok(Self {
            base,
            api_key: Arc::from(api_key.trim()),
            client,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn upstream_url(&self, path: &str, query: Option<&str>) -> Result<Url, ProxyError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ProxyError::InvalidBase(self.base.to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    async fn forward(
        &self,
        method: Method,
        url: Url,
        body: Option<Bytes>,
    ) -> Result<Response, ProxyError> {
        bom_debug!("Relaying {} {}", method, bom_logging::redact_url(url.as_str()));
        let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|err| ProxyError::Upstream(err.to_string()))?;
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&*self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        let upstream = request.send().await.map_err(|err| {
            bom_warn!("Upstream unreachable: {}", err);
            ProxyError::Upstream(err.to_string())
        })?;

        let status =
            StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = upstream
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok())
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        let bytes = upstream
            .bytes()
            .await
            .map_err(|err| ProxyError::Upstream(err.to_string()))?;

        Ok((status, [(CONTENT_TYPE, content_type)], bytes.to_vec()).into_response())
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(
            &format!("{RELAY_PREFIX}/object/{{segment}}"),
            get(object_route).delete(object_route),
        )
        .route(&format!("{RELAY_PREFIX}/{{*path}}"), any(relay))
        .with_state(state)
}

async fn relay(
    State(state): State<ProxyState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let url = state.upstream_url(&path, query.as_deref())?;
    let body = if method == Method::GET || method == Method::HEAD {
        None
    } else {
        Some(body)
    };
    state.forward(method, url, body).await
}

async fn object_route(
    State(state): State<ProxyState>,
    method: Method,
    Path(segment): Path<String>,
) -> Result<Response, ProxyError> {
    let id = object_id_from_segment(&segment)?;
    let url = state.upstream_url(&format!("objects/{id}"), None)?;
    state.forward(method, url, None).await
}

/// Extracts `<id>` from an `object-<id>` path segment.
pub fn object_id_from_segment(segment: &str) -> Result<&str, ProxyError> {
    segment
        .strip_prefix(OBJECT_SEGMENT_PREFIX)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProxyError::MissingObjectPrefix(segment.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_segment_requires_prefix_and_id() {
        assert_eq!(object_id_from_segment("object-abc123").unwrap(), "abc123");
        assert!(object_id_from_segment("abc123").is_err());
        assert!(object_id_from_segment("object-").is_err());
    }

    #[test]
    fn upstream_url_keeps_base_path_and_query() {
        let state = ProxyState::new("https://api.example.com/api/v1/", "k", None).unwrap();
        let url = state
            .upstream_url("objects/upload-url", Some("limit=5"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/api/v1/objects/upload-url?limit=5"
        );
    }

    #[test]
    fn credential_is_required() {
        assert!(matches!(
            ProxyState::new("https://api.example.com", "  ", None),
            Err(ProxyError::MissingCredential)
        ));
    }
}
