use super::assets::{serve_asset, AssetRoot};
use super::auth::require_basic_auth;
use super::proxy::{proxy_handler, ProxyState};
use crate::config::{IndexConfig, WebConfig};
use crate::tls::TlsListener;
use axum::{
    extract::FromRef,
    middleware,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_rustls::rustls::ServerConfig;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest request body the proxy will forward. Kibana sends queries and
/// dashboard documents, never bulk payloads.
pub const MAX_PROXY_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build search engine client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("web server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub proxy: ProxyState,
    pub assets: AssetRoot,
}

impl AppState {
    pub fn new(web: &WebConfig, index: &IndexConfig) -> Result<Self, ServerError> {
        Ok(Self {
            proxy: ProxyState::new(index.base_url.clone())?,
            assets: AssetRoot::new(web.root.clone()),
        })
    }
}

impl FromRef<AppState> for ProxyState {
    fn from_ref(state: &AppState) -> Self {
        state.proxy.clone()
    }
}

impl FromRef<AppState> for AssetRoot {
    fn from_ref(state: &AppState) -> Self {
        state.assets.clone()
    }
}

/// Assemble the HTTP surface: the guarded `/es` proxy plus static dashboard
/// assets, behind optional basic auth.
pub fn router(state: AppState, web: &WebConfig) -> Router {
    let proxy_routes = Router::new()
        .route("/es", any(proxy_handler))
        .route("/es/", any(proxy_handler))
        .route("/es/{*path}", any(proxy_handler))
        .route_layer(RequestBodyLimitLayer::new(MAX_PROXY_BODY_BYTES))
        .route_layer(GlobalConcurrencyLimitLayer::new(web.max_concurrency));

    let asset_routes = Router::new()
        .route("/", get(serve_asset))
        .route("/{*path}", get(serve_asset));

    let mut app = proxy_routes.merge(asset_routes).with_state(state);

    if let Some(credentials) = &web.auth {
        app = app.layer(middleware::from_fn_with_state(
            Arc::new(credentials.clone()),
            require_basic_auth,
        ));
    }

    app.layer(TraceLayer::new_for_http())
}

/// Bind before anything is spawned so a taken port fails startup.
pub async fn bind(web: &WebConfig) -> Result<TcpListener, ServerError> {
    TcpListener::bind(web.listen)
        .await
        .map_err(|source| ServerError::Bind {
            addr: web.listen,
            source,
        })
}

/// Serve until the task is aborted, terminating TLS when a server config is
/// given.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    tls: Option<Arc<ServerConfig>>,
) -> Result<(), ServerError> {
    let addr = listener.local_addr().map_err(ServerError::Serve)?;

    match tls {
        Some(server_config) => {
            info!("Web server listening on https://{}", addr);
            axum::serve(TlsListener::new(listener, server_config), app)
                .await
                .map_err(ServerError::Serve)
        }
        None => {
            info!("Web server listening on http://{}", addr);
            axum::serve(listener, app)
                .await
                .map_err(ServerError::Serve)
        }
    }
}
