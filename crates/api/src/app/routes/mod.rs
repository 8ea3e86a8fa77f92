use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use tenantchat_auth::authorize::{ADMIN_ONLY, STAFF};

use crate::middleware::{RoleGuard, require_roles};

pub mod auth;
pub mod channels;
pub mod messages;
pub mod stream;
pub mod system;
pub mod tenants;
pub mod users;

/// Router for all authenticated (tenant-scoped) endpoints.
///
/// `route_layer` only wraps the methods registered before it, so gated
/// methods come first and open ones are chained after the guard.
pub fn router() -> Router {
    let staff = from_fn_with_state(RoleGuard(STAFF), require_roles);
    let admin = from_fn_with_state(RoleGuard(ADMIN_ONLY), require_roles);

    Router::new()
        .route("/stream/token", get(stream::token))
        .route(
            "/users",
            post(users::create_user)
                .route_layer(staff.clone())
                .get(users::list_users),
        )
        .route(
            "/users/:id",
            put(users::update_user)
                .route_layer(staff.clone())
                .merge(axum::routing::delete(users::delete_user).route_layer(admin)),
        )
        .route(
            "/channels",
            post(channels::create_channel)
                .route_layer(staff)
                .get(channels::list_channels),
        )
        .route("/messages", post(messages::send_message))
        .route("/messages/:channel_id", get(messages::list_messages))
}
