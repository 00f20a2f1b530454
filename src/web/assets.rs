use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const INDEX_FILE: &str = "index.html";

/// Directory the dashboard assets are served from.
#[derive(Debug, Clone)]
pub struct AssetRoot(Arc<PathBuf>);

impl AssetRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(Arc::new(root.into()))
    }

    /// Map a request path onto a file below the root. `None` if the path
    /// tries to leave the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let mut path = PathBuf::clone(&self.0);
        for segment in request_path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

/// Content type by extension. Anything unlisted is sent without one.
pub fn content_type(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => Some("application/javascript"),
        Some("css") => Some("text/css"),
        Some("html") => Some("text/html"),
        _ => None,
    }
}

pub async fn serve_asset(State(root): State<AssetRoot>, uri: Uri) -> Response {
    let Some(mut path) = root.resolve(uri.path()) else {
        debug!(uri = %uri, "Rejected asset path");
        return StatusCode::NOT_FOUND.into_response();
    };

    if tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        path.push(INDEX_FILE);
    }

    let contents = match tokio::fs::read(&path).await {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Asset not found");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let mut response = Response::new(Body::from(contents));
    if let Some(content_type) = content_type(&path) {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}
