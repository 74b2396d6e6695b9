//! Same-origin gate for the relay endpoints.

use crate::shelly::response::ErrorBody;
use axum::{
    extract::Request,
    http::{
        header::{HOST, ORIGIN},
        HeaderMap, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Reject cross-origin requests; requests without an `Origin` header pass.
pub async fn require_same_origin(request: Request, next: Next) -> Response {
    if origin_allowed(request.headers()) {
        return next.run(request).await;
    }

    warn!(
        "Rejected request with foreign origin {:?}",
        request.headers().get(ORIGIN)
    );
    (
        StatusCode::FORBIDDEN,
        Json(ErrorBody::new("invalid_origin", "Origin header does not match this host.")),
    )
        .into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn comma_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(|part| part.trim().to_ascii_lowercase())
        .filter(|part| !part.is_empty())
}

/// Whether the `Origin` header (if any) names this host.
///
/// Hosts come from `Host` and `X-Forwarded-Host`, schemes from
/// `X-Forwarded-Proto` with `http` as the default. With no known host the
/// request is allowed.
pub fn origin_allowed(headers: &HeaderMap) -> bool {
    let Some(origin) = headers.get(ORIGIN) else {
        return true;
    };
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let origin = origin.trim().to_ascii_lowercase();
    if origin.is_empty() {
        return false;
    }

    let mut hosts: Vec<String> = Vec::new();
    if let Some(host) = header_str(headers, HOST) {
        hosts.extend(comma_list(host));
    }
    if let Some(forwarded) = header_str(headers, X_FORWARDED_HOST) {
        hosts.extend(comma_list(forwarded));
    }
    hosts.dedup();
    if hosts.is_empty() {
        return true;
    }

    let mut schemes: Vec<String> = header_str(headers, X_FORWARDED_PROTO)
        .map(|raw| {
            comma_list(raw)
                .filter(|scheme| scheme == "http" || scheme == "https")
                .collect()
        })
        .unwrap_or_default();
    if schemes.is_empty() {
        schemes.push("http".to_string());
    }

    hosts.iter().any(|host| {
        schemes
            .iter()
            .any(|scheme| origin == format!("{}://{}", scheme, host))
    })
}
