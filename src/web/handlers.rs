//! HTTP handlers for API endpoints.

use crate::error::{ErrorClass, ErrorCode};
use crate::shelly::response::{BatchResponse, CommandResponse, ErrorBody};
use crate::shelly::{CommandRequest, DeviceController};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared state handed to every handler.
pub type AppState = Arc<DeviceController>;

/// HTTP status for a device-control error.
pub fn status_for(code: &ErrorCode) -> StatusCode {
    match code.class() {
        ErrorClass::Configuration | ErrorClass::Validation => StatusCode::BAD_REQUEST,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Upstream => StatusCode::BAD_GATEWAY,
        ErrorClass::Capability => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(error, message))).into_response()
}

/// Current state of every configured relay.
///
/// Always 200 with per-device detail, unless no device can be reached at all.
pub async fn list_devices(State(controller): State<AppState>) -> Response {
    match controller.list().await {
        Ok(batch) => Json(BatchResponse::from(&batch)).into_response(),
        Err(code) => {
            error!("Device list unavailable: {}", code);
            (
                status_for(&code),
                Json(BatchResponse::unavailable(code.tag(), code.to_string())),
            )
                .into_response()
        }
    }
}

/// Switch a relay on, off, or toggle it.
pub async fn send_command(
    State(controller): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Response {
    if let Err(code) = controller.ensure_available() {
        return error_response(status_for(&code), code.tag(), code.to_string());
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected command payload: {}", rejection);
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_payload",
                "Request body must be a JSON object.",
            );
        }
    };

    if request.device_id.trim().is_empty() || request.action.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_parameters",
            "Required fields: device, action.",
        );
    }

    match controller.command(&request).await {
        Ok(result) => {
            let status = result.error.as_ref().map(status_for).unwrap_or(StatusCode::OK);
            (status, Json(CommandResponse::from(&result))).into_response()
        }
        Err(code) => error_response(status_for(&code), code.tag(), code.to_string()),
    }
}

/// Health check endpoint.
pub async fn health_check(State(controller): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "shelly-panel",
        "version": env!("CARGO_PKG_VERSION"),
        "devices": controller.devices().len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ErrorCode::InvalidAction("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&ErrorCode::MissingHost), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&ErrorCode::InvalidHost), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&ErrorCode::InvalidAuth), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&ErrorCode::DeviceNotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&ErrorCode::Transport("timeout".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&ErrorCode::Http { status: 500 }), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&ErrorCode::JsonDecode("eof".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&ErrorCode::MissingCapability("none".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
