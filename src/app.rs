use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/contributions", get(handlers::get_contributions))
        .route("/api/view", get(handlers::get_view))
        .route("/api/growth-chart", get(handlers::get_growth_chart))
        .with_state(state)
}
