use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use consultation_cell::consultation_routes;
use coupon_cell::coupon_routes;
use shared_config::AppConfig;

const HEALTH_MESSAGE: &str = "Consultation booking API is running!";

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let api = Router::new()
        .route("/", get(|| async { HEALTH_MESSAGE }))
        .merge(consultation_routes(state.clone()))
        .merge(coupon_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { HEALTH_MESSAGE }))
        .nest("/api", api)
}
