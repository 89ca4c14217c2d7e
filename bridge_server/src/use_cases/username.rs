// Username resolution order: first body field, then the `X-Username`
// header, then the identity behind an optional bearer token.

use crate::domain::AuthProvider;
use axum::http::HeaderMap;

pub async fn resolve_username(
    body_username: Option<&str>,
    headers: &HeaderMap,
    auth: &dyn AuthProvider,
) -> Option<String> {
    if let Some(name) = body_username.filter(|s| !s.is_empty()) {
        return Some(name.to_string());
    }

    if let Some(header_name) = headers
        .get("X-Username")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
    {
        return Some(header_name.to_string());
    }

    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))?;

    auth.me(token).await.ok().map(|res| res.user.username)
}
