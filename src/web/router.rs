//! Web application router and middleware setup.

use crate::shelly::DeviceController;
use crate::web::config::WebConfig;
use crate::web::{handlers, security};
use axum::{
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Create the main axum application with all routes and middleware.
pub fn create_app(config: &WebConfig, controller: Arc<DeviceController>) -> Router {
    let shelly_routes = Router::new()
        .route("/list", get(handlers::list_devices))
        .route("/command", post(handlers::send_command))
        .layer(middleware::from_fn(security::require_same_origin))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
        ));

    let mut app = Router::new()
        .nest("/api/shelly", shelly_routes)
        .route("/api/health", get(handlers::health_check))
        .with_state(controller);

    // Dashboard front-end, if one is deployed next to the binary
    if let Some(static_path) = &config.static_path {
        let static_path = PathBuf::from(static_path);
        if static_path.exists() {
            info!("Serving static files from: {:?}", static_path);
            app = app.fallback_service(ServeDir::new(static_path));
        } else {
            warn!("Static path {:?} does not exist, not serving files", static_path);
        }
    }

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
