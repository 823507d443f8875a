use thiserror::Error;

use shared_database::SupabaseError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum CouponError {
    /// Deliberately covers unknown, inactive and out-of-window codes alike.
    #[error("Coupon not found or expired")]
    NotFound,

    #[error("Minimum order value for this coupon is R$ {minimum:.2}")]
    BelowMinimum { minimum: f64 },

    #[error("Coupon usage limit exhausted")]
    Exhausted,

    #[error("Coupon code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Coupon is being redeemed concurrently, please retry")]
    Contention,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<SupabaseError> for CouponError {
    fn from(err: SupabaseError) -> Self {
        CouponError::DatabaseError(err.to_string())
    }
}

impl From<CouponError> for AppError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::NotFound => AppError::NotFound(err.to_string()),
            CouponError::BelowMinimum { .. }
            | CouponError::Exhausted
            | CouponError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            CouponError::DuplicateCode(_) | CouponError::Contention => AppError::Conflict(err.to_string()),
            CouponError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
