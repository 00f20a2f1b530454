pub mod assets;
pub mod auth;
pub mod firewall;
pub mod proxy;
pub mod server;

pub use assets::AssetRoot;
pub use firewall::{evaluate, Verdict};
pub use proxy::{ProxyError, ProxyState};
pub use server::{bind, router, serve, AppState, ServerError, MAX_PROXY_BODY_BYTES};
