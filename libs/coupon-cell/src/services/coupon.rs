use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};

use crate::error::CouponError;
use crate::models::{Coupon, CouponQuote, CreateCouponRequest, DiscountKind};
use crate::services::evaluator::evaluate_coupon;

/// Bounded retries for the usage-counter compare-and-swap.
const MAX_CAS_ATTEMPTS: usize = 3;

pub struct CouponService {
    supabase: Arc<SupabaseClient>,
}

impl CouponService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Active coupon with exactly this code, if any.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponError> {
        let path = format!(
            "/rest/v1/coupons?code=eq.{}&active=eq.true&limit=1",
            urlencoding::encode(code)
        );
        let mut rows: Vec<Coupon> = self.supabase.select(&path).await?;
        Ok(rows.pop())
    }

    async fn find_by_id(&self, coupon_id: Uuid) -> Result<Option<Coupon>, CouponError> {
        let path = format!("/rest/v1/coupons?id=eq.{}", coupon_id);
        let mut rows: Vec<Coupon> = self.supabase.select(&path).await?;
        Ok(rows.pop())
    }

    /// Quote a coupon against an order value without touching its usage counter.
    pub async fn validate_coupon(&self, code: &str, order_value: f64) -> Result<CouponQuote, CouponError> {
        debug!("Validating coupon {} for order value {:.2}", code, order_value);

        let coupon = self.find_by_code(code).await?.ok_or(CouponError::NotFound)?;
        evaluate_coupon(&coupon, order_value, Utc::now())
    }

    /// Evaluate and consume one use of the coupon.
    ///
    /// The counter moves only if nobody else moved it since we read it
    /// (`usage_count=eq.<observed>`); on a lost race the coupon is re-read and
    /// re-evaluated, so a cap reached meanwhile surfaces as `Exhausted`.
    pub async fn redeem(&self, code: &str, order_value: f64) -> Result<(Coupon, CouponQuote), CouponError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let coupon = self.find_by_code(code).await?.ok_or(CouponError::NotFound)?;
            let quote = evaluate_coupon(&coupon, order_value, Utc::now())?;

            let path = format!(
                "/rest/v1/coupons?id=eq.{}&usage_count=eq.{}",
                coupon.id, coupon.usage_count
            );
            let updated: Vec<Coupon> = self
                .supabase
                .update(&path, json!({ "usage_count": coupon.usage_count + 1 }))
                .await?;

            if let Some(redeemed) = updated.into_iter().next() {
                info!("Coupon {} redeemed ({} uses)", redeemed.code, redeemed.usage_count);
                return Ok((redeemed, quote));
            }

            warn!("Coupon {} usage counter changed concurrently (attempt {})", code, attempt);
        }

        Err(CouponError::Contention)
    }

    /// Give back a use taken by `redeem` when the order it was for did not go through.
    pub async fn release(&self, coupon_id: Uuid) -> Result<(), CouponError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let coupon = self.find_by_id(coupon_id).await?.ok_or(CouponError::NotFound)?;
            if coupon.usage_count <= 0 {
                return Ok(());
            }

            let path = format!(
                "/rest/v1/coupons?id=eq.{}&usage_count=eq.{}",
                coupon.id, coupon.usage_count
            );
            let updated: Vec<Coupon> = self
                .supabase
                .update(&path, json!({ "usage_count": coupon.usage_count - 1 }))
                .await?;

            if !updated.is_empty() {
                info!("Released one use of coupon {}", coupon.code);
                return Ok(());
            }

            warn!("Coupon {} release raced (attempt {})", coupon.code, attempt);
        }

        Err(CouponError::Contention)
    }

    pub async fn list_coupons(&self) -> Result<Vec<Coupon>, CouponError> {
        let coupons = self
            .supabase
            .select("/rest/v1/coupons?order=created_at.desc")
            .await?;
        Ok(coupons)
    }

    pub async fn create_coupon(&self, request: CreateCouponRequest) -> Result<Coupon, CouponError> {
        validate_new_coupon(&request)?;

        let row = json!({
            "code": request.code.trim(),
            "description": request.description,
            "discount_kind": request.discount_kind,
            "discount_value": request.discount_value,
            "minimum_order_value": request.minimum_order_value,
            "valid_from": request.valid_from,
            "valid_until": request.valid_until,
            "usage_cap": request.usage_cap,
            "usage_count": 0,
            "active": request.active.unwrap_or(true),
        });

        match self.supabase.insert::<Coupon, _>("coupons", &row).await {
            Ok(coupon) => {
                info!("Created coupon {}", coupon.code);
                Ok(coupon)
            }
            Err(SupabaseError::Conflict(_)) => Err(CouponError::DuplicateCode(request.code.trim().to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_coupon(&self, coupon_id: Uuid) -> Result<(), CouponError> {
        let path = format!("/rest/v1/coupons?id=eq.{}", coupon_id);
        let removed: Vec<Coupon> = self.supabase.delete(&path).await?;

        if removed.is_empty() {
            return Err(CouponError::NotFound);
        }

        info!("Deleted coupon {}", coupon_id);
        Ok(())
    }
}

fn validate_new_coupon(request: &CreateCouponRequest) -> Result<(), CouponError> {
    if request.code.trim().is_empty() {
        return Err(CouponError::ValidationError("Coupon code is required".to_string()));
    }

    match request.discount_kind {
        DiscountKind::Percentage if !(request.discount_value > 0.0 && request.discount_value <= 100.0) => {
            return Err(CouponError::ValidationError(
                "Percentage discount must be greater than 0 and at most 100".to_string(),
            ));
        }
        DiscountKind::FixedAmount if !(request.discount_value > 0.0) => {
            return Err(CouponError::ValidationError(
                "Fixed discount must be greater than 0".to_string(),
            ));
        }
        _ => {}
    }

    if request.valid_from >= request.valid_until {
        return Err(CouponError::ValidationError(
            "Coupon validity must start before it ends".to_string(),
        ));
    }

    if request.minimum_order_value.is_some_and(|minimum| minimum < 0.0) {
        return Err(CouponError::ValidationError("Minimum order value cannot be negative".to_string()));
    }

    if request.usage_cap.is_some_and(|cap| cap <= 0) {
        return Err(CouponError::ValidationError("Usage cap must be positive".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn request(kind: DiscountKind, value: f64) -> CreateCouponRequest {
        let now = Utc::now();
        CreateCouponRequest {
            code: "WELCOME10".to_string(),
            description: "Welcome".to_string(),
            discount_kind: kind,
            discount_value: value,
            minimum_order_value: None,
            valid_from: now,
            valid_until: now + Duration::days(10),
            usage_cap: None,
            active: None,
        }
    }

    #[test]
    fn test_coupon_rules() {
        assert!(validate_new_coupon(&request(DiscountKind::Percentage, 100.0)).is_ok());
        assert!(validate_new_coupon(&request(DiscountKind::FixedAmount, 15.5)).is_ok());

        assert_matches!(
            validate_new_coupon(&request(DiscountKind::Percentage, 120.0)),
            Err(CouponError::ValidationError(_))
        );
        assert_matches!(
            validate_new_coupon(&request(DiscountKind::FixedAmount, 0.0)),
            Err(CouponError::ValidationError(_))
        );

        let mut inverted = request(DiscountKind::Percentage, 10.0);
        inverted.valid_until = inverted.valid_from - Duration::days(1);
        assert_matches!(validate_new_coupon(&inverted), Err(CouponError::ValidationError(_)));
    }
}
