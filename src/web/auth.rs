use crate::config::BasicCredentials;
use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::debug;

const CHALLENGE: &str = r#"Basic realm="traildash""#;

/// Rejects any request whose `Authorization` header does not carry the
/// configured user and password.
pub async fn require_basic_auth(
    State(credentials): State<Arc<BasicCredentials>>,
    request: Request,
    next: Next,
) -> Response {
    if authorized(request.headers(), &credentials) {
        return next.run(request).await;
    }

    debug!(uri = %request.uri(), "Rejected unauthenticated request");
    let mut response = StatusCode::UNAUTHORIZED.into_response();
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
    response
}

fn authorized(headers: &HeaderMap, credentials: &BasicCredentials) -> bool {
    decode_basic(headers).is_some_and(|(user, password)| {
        // Evaluate both so a wrong user costs the same as a wrong password.
        let user_ok = constant_time_eq(&user, &credentials.user);
        let password_ok = constant_time_eq(&password, &credentials.password);
        user_ok & password_ok
    })
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn decode_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}
