use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/headlines", get(handlers::headlines))
        .route("/api/search", get(handlers::search))
        .route("/api/sources", get(handlers::list_sources))
        .route("/api/categories", get(handlers::list_categories))
        .route(
            "/api/preferences",
            get(handlers::get_preferences).put(handlers::replace_preferences),
        )
        .route("/api/preferences/reset", post(handlers::reset_preferences))
        .route("/api/preferences/sources/:id/toggle", post(handlers::toggle_source))
        .route("/api/preferences/categories/:id/toggle", post(handlers::toggle_category))
        .route("/api/preferences/authors/:id/toggle", post(handlers::toggle_author))
        .route("/api/preferences/authors", post(handlers::add_author))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, AppState};
    pub use nd_core::{Article, Error, Result};
}
