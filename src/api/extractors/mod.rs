pub mod admin;
pub mod current_user;
