use chrono::{DateTime, Utc};

use shared_utils::validation::round_cents;

use crate::error::CouponError;
use crate::models::{Coupon, CouponQuote, DiscountKind};

/// Work out the discount a coupon grants on `order_value` at instant `now`.
///
/// Checks run in a fixed order: availability (active + validity window), minimum
/// order value, then usage cap. Unavailable coupons are reported as `NotFound` so
/// callers learn nothing about validity windows. The discount is clamped to the order value.
/// Read-only: redemption is a separate step.
pub fn evaluate_coupon(coupon: &Coupon, order_value: f64, now: DateTime<Utc>) -> Result<CouponQuote, CouponError> {
    if !order_value.is_finite() || order_value < 0.0 {
        return Err(CouponError::ValidationError("Order value must be a non-negative amount".to_string()));
    }

    if !coupon.active || !coupon.is_within_window(now) {
        return Err(CouponError::NotFound);
    }

    if let Some(minimum) = coupon.minimum_order_value {
        if order_value < minimum {
            return Err(CouponError::BelowMinimum { minimum });
        }
    }

    if coupon.is_exhausted() {
        return Err(CouponError::Exhausted);
    }

    let raw_discount = match coupon.discount_kind {
        DiscountKind::Percentage => order_value * (coupon.discount_value / 100.0),
        DiscountKind::FixedAmount => coupon.discount_value,
    };
    let discount = round_cents(raw_discount.clamp(0.0, order_value));

    Ok(CouponQuote {
        valid: true,
        code: coupon.code.clone(),
        discount,
        original_value: round_cents(order_value),
        final_value: round_cents(order_value - discount),
    })
}
