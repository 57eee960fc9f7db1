pub mod admin;
pub mod affiliate;
pub mod booking;
pub mod health;
pub mod registration;
