//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/provider/token wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and the JSON body extractor
//! - `errors.rs`: consistent error responses
//! - `cors.rs`: browser access

use std::sync::Arc;

use axum::{
    Extension, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower::ServiceBuilder;

use tenantchat_auth::authorize::ADMIN_ONLY;

use crate::config::AppConfig;
use crate::middleware::{self, AuthState, RoleGuard};

pub mod cors;
pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use cors::AllowedOrigins;
use services::AppServices;

/// Router switches that come from configuration.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Serve `GET /tenants` without a token.
    pub public_tenant_listing: bool,
    pub allowed_origins: AllowedOrigins,
}

impl From<&AppConfig> for RouterOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            public_tenant_listing: config.public_tenant_listing,
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<AppServices>, options: RouterOptions) -> Router {
    let auth_state = AuthState {
        tokens: services.tokens.clone(),
    };
    let authenticated = from_fn_with_state(auth_state, middleware::authenticate);
    let admin_only = from_fn_with_state(RoleGuard(ADMIN_ONLY), middleware::require_roles);

    // Protected routes: require a valid token; role checks are per route.
    let protected = routes::router().route_layer(authenticated.clone());

    // POST /tenants is always Admin-only; GET may be public.
    let tenants = post(routes::tenants::create_tenant);
    let tenants = if options.public_tenant_listing {
        tenants
            .route_layer(admin_only)
            .route_layer(authenticated)
            .get(routes::tenants::list_tenants)
    } else {
        tenants
            .get(routes::tenants::list_tenants)
            .route_layer(admin_only)
            .route_layer(authenticated)
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/register", post(routes::auth::register))
        .route("/tenants", tenants)
        .merge(protected)
        // CORS outermost so preflights are answered before auth runs.
        .layer(
            ServiceBuilder::new()
                .layer(cors::layer(&options.allowed_origins))
                .layer(Extension(services)),
        )
}
