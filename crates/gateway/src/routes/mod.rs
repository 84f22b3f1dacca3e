//! HTTP routes for the delivery gateway.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenCodec;
use crate::config::Config;
use crate::cookies::CookieSettings;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_admin, require_auth, AuthState};
use crate::services::IdentityService;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Issues and verifies access/refresh tokens.
    pub codec: Arc<dyn TokenCodec>,

    /// Identity Service client.
    pub identity: Arc<dyn IdentityService>,

    /// Attributes of the refresh token cookie.
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(
        config: Config,
        codec: Arc<dyn TokenCodec>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        let cookies = CookieSettings::from_config(&config);
        Self {
            config,
            codec,
            identity,
            cookies,
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/healthz`, `/ping` - public, unversioned
/// - `/metrics` - Prometheus scrape endpoint, only when a handle is given
/// - `POST /v1/users`, `POST /v1/login` - public, proxied to the Identity Service
/// - `POST /renew_token`, `POST /v1/renew_token` - refresh cookie only
/// - `POST /logout`, `POST /v1/logout` - clears the refresh cookie
/// - `/v1/users/my_profile[/phone_number]` - requires authentication (read, edit, delete)
/// - `/v1/admin/users/{id}` - requires authentication and the admin role
/// - TraceLayer, request timeout, HTTP metrics
pub fn build_routes(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_state = Arc::new(AuthState {
        codec: state.codec.clone(),
    });
    let request_timeout = state.config.request_timeout;

    let public_routes = Router::new()
        .route("/healthz", get(handlers::health_check))
        .route("/ping", get(handlers::ping))
        .route("/renew_token", post(handlers::renew_token))
        .route("/logout", post(handlers::logout))
        .route("/v1/users", post(handlers::create_user))
        .route("/v1/login", post(handlers::login))
        .route("/v1/renew_token", post(handlers::renew_token))
        .route("/v1/logout", post(handlers::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route(
            "/v1/users/my_profile",
            get(handlers::get_my_profile)
                .patch(handlers::update_my_name)
                .delete(handlers::delete_my_account),
        )
        .route(
            "/v1/users/my_profile/phone_number",
            patch(handlers::add_my_phone),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            require_auth,
        ))
        .with_state(state.clone());

    // route_layer order: require_auth (added last) runs first
    let admin_routes = Router::new()
        .route("/v1/admin/users/:id", get(handlers::get_user_as_admin))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    let mut app = public_routes.merge(protected_routes).merge(admin_routes);

    if let Some(handle) = metrics_handle {
        let metrics_routes = Router::new()
            .route("/metrics", get(handlers::metrics_handler))
            .with_state(handle);
        app = app.merge(metrics_routes);
    }

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    app.layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}
