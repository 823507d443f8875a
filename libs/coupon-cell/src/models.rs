use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// COUPONS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    FixedAmount,
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountKind::Percentage => write!(f, "percentage"),
            DiscountKind::FixedAmount => write!(f, "fixed_amount"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub discount_kind: DiscountKind,
    /// Percent (0-100] for `Percentage`, currency amount for `FixedAmount`.
    pub discount_value: f64,
    pub minimum_order_value: Option<f64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_cap: Option<i32>,
    pub usage_count: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_cap.is_some_and(|cap| self.usage_count >= cap)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCouponRequest {
    pub code: String,
    pub description: String,
    pub discount_kind: DiscountKind,
    pub discount_value: f64,
    pub minimum_order_value: Option<f64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_cap: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateCouponQuery {
    pub code: String,
    pub order_value: f64,
}

/// Outcome of evaluating a coupon against an order value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CouponQuote {
    pub valid: bool,
    pub code: String,
    pub discount: f64,
    pub original_value: f64,
    pub final_value: f64,
}

// ==============================================================================
// REFERRALS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Converted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub client_id: Uuid,
    pub referred_name: String,
    pub referred_phone: String,
    pub code: String,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReferralRequest {
    pub referred_name: String,
    pub referred_phone: String,
}

#[derive(Debug, Deserialize)]
pub struct ReferralQuery {
    pub client_id: Uuid,
}
