pub mod availability;
pub mod booking;
pub mod catalog;
pub mod conflict;
pub mod lifecycle;
pub mod slots;
