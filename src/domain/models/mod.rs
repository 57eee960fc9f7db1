pub mod affiliate;
pub mod booking;
pub mod user;
