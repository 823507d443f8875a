use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{ValidatedJson, ValidatedQuery};

use crate::models::{
    Coupon, CouponQuote, CreateCouponRequest, CreateReferralRequest, Referral, ReferralQuery,
    ValidateCouponQuery,
};
use crate::services::{CouponService, ReferralService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn validate_coupon(
    State(state): State<Arc<AppConfig>>,
    ValidatedQuery(query): ValidatedQuery<ValidateCouponQuery>,
) -> Result<Json<CouponQuote>, AppError> {
    let service = CouponService::new(&state);
    let quote = service.validate_coupon(&query.code, query.order_value).await?;
    Ok(Json(quote))
}

#[axum::debug_handler]
pub async fn create_referral(
    State(state): State<Arc<AppConfig>>,
    ValidatedQuery(query): ValidatedQuery<ReferralQuery>,
    ValidatedJson(request): ValidatedJson<CreateReferralRequest>,
) -> Result<(StatusCode, Json<Referral>), AppError> {
    let service = ReferralService::new(&state);
    let referral = service.create_referral(query.client_id, request).await?;
    Ok((StatusCode::CREATED, Json(referral)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_coupons(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    debug!("Admin {} listing coupons", user.id);
    let service = CouponService::new(&state);
    Ok(Json(service.list_coupons().await?))
}

#[axum::debug_handler]
pub async fn create_coupon(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    ValidatedJson(request): ValidatedJson<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>), AppError> {
    debug!("Admin {} creating coupon {}", user.id, request.code);
    let service = CouponService::new(&state);
    let coupon = service.create_coupon(request).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

#[axum::debug_handler]
pub async fn delete_coupon(
    State(state): State<Arc<AppConfig>>,
    Path(coupon_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = CouponService::new(&state);
    service.delete_coupon(coupon_id).await?;
    Ok(Json(json!({ "deleted": coupon_id })))
}

#[axum::debug_handler]
pub async fn list_referrals(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Vec<Referral>>, AppError> {
    let service = ReferralService::new(&state);
    Ok(Json(service.list_referrals().await?))
}
