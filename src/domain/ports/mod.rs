use crate::domain::models::{
    affiliate::{AffiliateApplication, AffiliatePayout, AffiliateProfile, Decision, ProfileStatus, Referral},
    booking::{Booking, BookingStatus},
    user::User,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn list_booked_times(&self, date: NaiveDate) -> Result<Vec<String>, AppError>;
    async fn list(&self, date: Option<NaiveDate>) -> Result<Vec<Booking>, AppError>;
    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_with_referral(&self, user: &User, referral: Option<&Referral>) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn set_role(&self, id: &str, role: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub enum Submission {
    Created {
        application: AffiliateApplication,
        profile: AffiliateProfile,
    },
    AlreadyPending(AffiliateApplication),
}

#[async_trait]
pub trait AffiliateRepository: Send + Sync {
    async fn latest_application(&self, user_id: &str) -> Result<Option<AffiliateApplication>, AppError>;
    async fn submit_application(&self, application: &AffiliateApplication, profile: &AffiliateProfile) -> Result<Submission, AppError>;
    async fn list_applications(&self, status: Option<&str>) -> Result<Vec<AffiliateApplication>, AppError>;
    async fn decide_application(&self, id: &str, decision: Decision, notes: Option<&str>, decided_by: &str) -> Result<AffiliateApplication, AppError>;

    async fn find_profile(&self, id: &str) -> Result<Option<AffiliateProfile>, AppError>;
    async fn find_profile_by_user(&self, user_id: &str) -> Result<Option<AffiliateProfile>, AppError>;
    async fn find_profile_by_code(&self, code: &str) -> Result<Option<AffiliateProfile>, AppError>;
    async fn list_profiles(&self) -> Result<Vec<AffiliateProfile>, AppError>;
    async fn update_profile_status(&self, id: &str, status: ProfileStatus) -> Result<AffiliateProfile, AppError>;

    async fn record_dashboard_referral(&self, referral: &Referral) -> Result<Referral, AppError>;
    async fn list_referrals(&self, affiliate_id: &str) -> Result<Vec<Referral>, AppError>;
    async fn convert_referral(&self, referral_id: &str, payment_amount: i64) -> Result<(Referral, AffiliateProfile), AppError>;
    async fn pay_out(&self, affiliate_id: &str, paid_by: &str) -> Result<(AffiliatePayout, AffiliateProfile), AppError>;
}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Default)]
pub struct CrmContact {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub lifecycle_stage: String,
    pub source: String,
}

#[async_trait]
pub trait CrmClient: Send + Sync {
    async fn upsert_contact(&self, contact: &CrmContact) -> Result<(), AppError>;
}
