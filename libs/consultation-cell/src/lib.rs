pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::BookingError;
pub use models::*;
pub use router::consultation_routes;
pub use services::availability::AvailabilityService;
pub use services::booking::AppointmentBookingService;
pub use services::catalog::ConsultationCatalogService;
