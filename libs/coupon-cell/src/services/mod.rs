pub mod coupon;
pub mod evaluator;
pub mod referral;

pub use coupon::CouponService;
pub use evaluator::evaluate_coupon;
pub use referral::ReferralService;
