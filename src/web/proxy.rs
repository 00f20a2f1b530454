use super::firewall::{evaluate, Verdict};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::HOST, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Permission denied")]
    Forbidden,

    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::Forbidden => StatusCode::FORBIDDEN,
            ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Upstream client and search engine base URL shared by all proxy requests.
#[derive(Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyState {
    /// `base_url` must not end in a slash.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

/// Rewrite `/es/<rest>?<query>` onto the search engine base.
pub fn upstream_url(base_url: &str, uri: &Uri) -> String {
    let path = uri.path();
    let rest = path.strip_prefix("/es").unwrap_or(path);

    let mut url = format!("{}{}", base_url, rest);
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }
    url
}

pub async fn proxy_handler(
    State(state): State<ProxyState>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    if evaluate(&parts.method, &parts.uri) == Verdict::Deny {
        warn!(method = %parts.method, uri = %parts.uri, "Denied search engine request");
        return Err(ProxyError::Forbidden);
    }

    let target = upstream_url(&state.base_url, &parts.uri);
    debug!(method = %parts.method, target = %target, "Proxying request");

    let mut headers = parts.headers;
    headers.remove(HOST);

    let upstream = state
        .client
        .request(parts.method, target)
        .headers(headers)
        .body(reqwest::Body::wrap_stream(body.into_data_stream()))
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "Search engine request failed");
            ProxyError::Upstream(e)
        })?;

    let status = upstream.status();
    let headers = upstream.headers().clone();

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
