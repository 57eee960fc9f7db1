use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const ROLE_USER: &str = "user";
pub const ROLE_PROFESSIONAL: &str = "Professional";
pub const ROLE_STUDENT: &str = "Student";
pub const ROLE_AFFILIATE: &str = "Affiliate";
pub const ROLE_SUBSCRIBER: &str = "subscriber";
pub const ROLE_ADMIN: &str = "admin";

pub const SELF_SERVICE_ROLES: [&str; 4] = [ROLE_USER, ROLE_PROFESSIONAL, ROLE_STUDENT, ROLE_SUBSCRIBER];

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub affiliate_id: Option<String>,
    pub referred_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, phone: Option<String>, role: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            phone,
            role,
            affiliate_id: None,
            referred_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}
