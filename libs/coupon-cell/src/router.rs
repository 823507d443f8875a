use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::admin_middleware;

use crate::handlers;

pub fn coupon_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/coupons/validate", post(handlers::validate_coupon))
        .route("/referrals", post(handlers::create_referral));

    let admin_routes = Router::new()
        .route("/admin/coupons", get(handlers::list_coupons).post(handlers::create_coupon))
        .route("/admin/coupons/{coupon_id}", delete(handlers::delete_coupon))
        .route("/admin/referrals", get(handlers::list_referrals))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
