use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::admin_middleware;

use crate::handlers;

pub fn consultation_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/consultation-types", get(handlers::list_consultation_types))
        .route("/availability/{date}", get(handlers::get_availability))
        .route("/appointments", post(handlers::book_appointment));

    let admin_routes = Router::new()
        // Catalog
        .route(
            "/admin/consultation-types",
            get(handlers::list_all_consultation_types).post(handlers::create_consultation_type),
        )
        .route(
            "/admin/consultation-types/{type_id}",
            put(handlers::update_consultation_type).delete(handlers::delete_consultation_type),
        )
        .route("/admin/consultation-types/seed", post(handlers::seed_defaults))
        // Weekly templates
        .route(
            "/admin/availability-templates",
            get(handlers::list_templates).post(handlers::create_template),
        )
        .route(
            "/admin/availability-templates/{template_id}",
            put(handlers::update_template).delete(handlers::delete_template),
        )
        // Appointments
        .route("/admin/appointments/{appointment_id}", get(handlers::get_appointment))
        .route("/admin/appointments/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route("/appointments/{appointment_id}/status", put(handlers::update_appointment_status))
        .route("/agenda/{date}", get(handlers::get_agenda))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
