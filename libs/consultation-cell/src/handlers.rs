use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::ValidatedJson;

use crate::models::{
    Appointment, AvailabilityResponse, AvailabilityTemplate, BookAppointmentRequest, ConsultationType,
    CreateConsultationTypeRequest, CreateTemplateRequest, SeedSummary, UpdateConsultationTypeRequest,
    UpdateStatusRequest, UpdateTemplateRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::booking::AppointmentBookingService;
use crate::services::catalog::ConsultationCatalogService;

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_consultation_types(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Vec<ConsultationType>>, AppError> {
    let service = ConsultationCatalogService::new(&state);
    Ok(Json(service.list_active().await?))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    Path(date): Path<String>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = parse_date(&date)?;
    let service = AvailabilityService::new(&state);
    Ok(Json(service.get_available_slots(date).await?))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    ValidatedJson(request): ValidatedJson<BookAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service.book_appointment(request).await?;
    Ok(Json(appointment))
}

// ==============================================================================
// ADMIN: CONSULTATION TYPES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_all_consultation_types(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Vec<ConsultationType>>, AppError> {
    let service = ConsultationCatalogService::new(&state);
    Ok(Json(service.list_all().await?))
}

#[axum::debug_handler]
pub async fn create_consultation_type(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    ValidatedJson(request): ValidatedJson<CreateConsultationTypeRequest>,
) -> Result<(StatusCode, Json<ConsultationType>), AppError> {
    debug!("Admin {} creating consultation type {}", user.id, request.name);
    let service = ConsultationCatalogService::new(&state);
    let created = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[axum::debug_handler]
pub async fn update_consultation_type(
    State(state): State<Arc<AppConfig>>,
    Path(type_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateConsultationTypeRequest>,
) -> Result<Json<ConsultationType>, AppError> {
    let service = ConsultationCatalogService::new(&state);
    Ok(Json(service.update(type_id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_consultation_type(
    State(state): State<Arc<AppConfig>>,
    Path(type_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationCatalogService::new(&state);
    service.delete(type_id).await?;
    Ok(Json(json!({ "deleted": type_id })))
}

#[axum::debug_handler]
pub async fn seed_defaults(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<SeedSummary>, AppError> {
    debug!("Admin {} seeding catalog defaults", user.id);
    let service = ConsultationCatalogService::new(&state);
    Ok(Json(service.seed_defaults().await?))
}

// ==============================================================================
// ADMIN: AVAILABILITY TEMPLATES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_templates(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Vec<AvailabilityTemplate>>, AppError> {
    let service = AvailabilityService::new(&state);
    Ok(Json(service.list_templates().await?))
}

#[axum::debug_handler]
pub async fn create_template(
    State(state): State<Arc<AppConfig>>,
    ValidatedJson(request): ValidatedJson<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<AvailabilityTemplate>), AppError> {
    let service = AvailabilityService::new(&state);
    let template = service.create_template(request).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

#[axum::debug_handler]
pub async fn update_template(
    State(state): State<Arc<AppConfig>>,
    Path(template_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTemplateRequest>,
) -> Result<Json<AvailabilityTemplate>, AppError> {
    let service = AvailabilityService::new(&state);
    Ok(Json(service.update_template(template_id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_template(
    State(state): State<Arc<AppConfig>>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    service.delete_template(template_id).await?;
    Ok(Json(json!({ "deleted": template_id })))
}

// ==============================================================================
// ADMIN: APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let service = AppointmentBookingService::new(&state);
    Ok(Json(service.get_appointment(appointment_id).await?))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let service = AppointmentBookingService::new(&state);
    Ok(Json(service.confirm_appointment(appointment_id).await?))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    debug!("Admin {} setting appointment {} to {}", user.id, appointment_id, request.status);
    let service = AppointmentBookingService::new(&state);
    Ok(Json(service.update_status(appointment_id, request).await?))
}

#[axum::debug_handler]
pub async fn get_agenda(
    State(state): State<Arc<AppConfig>>,
    Path(date): Path<String>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let date = parse_date(&date)?;
    let service = AppointmentBookingService::new(&state);
    Ok(Json(service.get_agenda(date).await?))
}
