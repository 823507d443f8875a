use thiserror::Error;

use coupon_cell::CouponError;
use shared_database::SupabaseError;
use shared_models::error::AppError;

use crate::models::AppointmentStatus;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Consultation type not found")]
    ConsultationTypeNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Availability template not found")]
    TemplateNotFound,

    #[error("Time slot is no longer available")]
    SlotUnavailable,

    #[error("Requested time is not an available slot: {0}")]
    InvalidSlot(String),

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("{0}")]
    InUse(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<SupabaseError> for BookingError {
    fn from(err: SupabaseError) -> Self {
        BookingError::DatabaseError(err.to_string())
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::ConsultationTypeNotFound
            | BookingError::AppointmentNotFound
            | BookingError::TemplateNotFound => AppError::NotFound(err.to_string()),
            BookingError::SlotUnavailable
            | BookingError::InvalidStatusTransition { .. }
            | BookingError::InUse(_) => AppError::Conflict(err.to_string()),
            BookingError::InvalidSlot(_) | BookingError::ValidationError(_) => {
                AppError::ValidationError(err.to_string())
            }
            BookingError::Coupon(coupon_err) => coupon_err.into(),
            BookingError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BookingError::ConsultationTypeNotFound, StatusCode::NOT_FOUND),
            (BookingError::SlotUnavailable, StatusCode::CONFLICT),
            (
                BookingError::InvalidStatusTransition {
                    from: AppointmentStatus::Completed,
                    to: AppointmentStatus::Confirmed,
                },
                StatusCode::CONFLICT,
            ),
            (BookingError::InvalidSlot("10:30".to_string()), StatusCode::BAD_REQUEST),
            (BookingError::Coupon(CouponError::NotFound), StatusCode::NOT_FOUND),
            (BookingError::Coupon(CouponError::Exhausted), StatusCode::BAD_REQUEST),
            (BookingError::DatabaseError("down".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }
}
