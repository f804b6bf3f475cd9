use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod admin;
pub mod audit;
pub mod auth;
pub mod contracts;
pub mod health;
pub mod views;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let contract_routes = Router::new()
        .route("/", post(contracts::create_contract))
        .route("/approval-queue", get(contracts::approval_queue))
        .route("/my-contracts", get(contracts::my_contracts))
        .route("/all-active", get(contracts::all_active))
        .route("/mapped-clients", get(contracts::mapped_clients))
        .route("/stats", get(contracts::contract_stats))
        .route(
            "/:id",
            get(contracts::get_contract).put(contracts::update_contract),
        )
        .route("/:id/submit", post(contracts::submit_contract))
        .route("/:id/approve", post(contracts::approve_contract))
        .route("/:id/reject", post(contracts::reject_contract));

    let admin_routes = Router::new()
        .route("/users/register", post(admin::register_user))
        .route("/users", get(admin::list_users))
        .route(
            "/approval-mappings",
            get(admin::list_mappings).post(admin::create_mapping),
        );

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/contracts", contract_routes)
        .nest("/admin", admin_routes)
        .route("/api/admin/audit/logs", get(audit::list_audit_logs))
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/auth", auth_routes)
        .route("/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let allow_origin = match allowed_origins {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(_) => {
                        warn!(origin = %value, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
