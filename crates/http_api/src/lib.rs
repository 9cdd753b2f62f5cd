mod errors;
mod handlers;
mod middleware;
mod state;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};

pub use middleware::BOARD_TOKEN_HEADER;
pub use state::{HttpState, generate_access_token};

pub fn router(state: HttpState) -> Router<()> {
    let api = Router::new()
        .route("/dashboard", post(handlers::dashboard))
        .route("/refresh", post(handlers::refresh))
        .route("/day", post(handlers::day))
        .route("/settings_get", post(handlers::settings_get))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_access_token,
        ));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
}
