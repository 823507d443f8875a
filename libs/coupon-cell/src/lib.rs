pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::CouponError;
pub use models::*;
pub use router::coupon_routes;
pub use services::*;
