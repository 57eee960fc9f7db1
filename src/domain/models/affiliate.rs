use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use crate::error::AppError;

/// Lifetime cap on the dashboard "refer a contact" action.
pub const DASHBOARD_REFERRAL_CAP: i32 = 1;

/// Largest payment a conversion may record, in paise (Rs 100 crore).
pub const MAX_PAYMENT_AMOUNT: i64 = 100_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" | "approve" => Ok(ApplicationStatus::Approved),
            "rejected" | "reject" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("Unknown application status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target(&self) -> ApplicationStatus {
        match self {
            Decision::Approve => ApplicationStatus::Approved,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<ApplicationStatus>()? {
            ApplicationStatus::Approved => Ok(Decision::Approve),
            ApplicationStatus::Rejected => Ok(Decision::Reject),
            ApplicationStatus::Pending => Err("Decision must be approve or reject".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Pending,
    Approved,
    Suspended,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Pending => "pending",
            ProfileStatus::Approved => "approved",
            ProfileStatus::Suspended => "suspended",
        }
    }

    pub fn can_transition_to(&self, next: ProfileStatus) -> bool {
        matches!(
            (self, next),
            (ProfileStatus::Pending, ProfileStatus::Approved)
                | (ProfileStatus::Pending, ProfileStatus::Suspended)
                | (ProfileStatus::Approved, ProfileStatus::Suspended)
                | (ProfileStatus::Suspended, ProfileStatus::Approved)
        )
    }
}

impl FromStr for ProfileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ProfileStatus::Pending),
            "approved" => Ok(ProfileStatus::Approved),
            "suspended" => Ok(ProfileStatus::Suspended),
            other => Err(format!("Unknown profile status: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AffiliateApplication {
    pub id: String,
    pub user_id: String,
    pub company_name: String,
    pub website_url: Option<String>,
    pub promotion_method: String,
    pub expected_referrals: Option<String>,
    pub reason: Option<String>,
    pub payment_email: Option<String>,
    pub status: String,
    pub admin_notes: Option<String>,
    pub approved_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ApplicationFields {
    pub company_name: String,
    pub website_url: Option<String>,
    pub promotion_method: String,
    pub expected_referrals: Option<String>,
    pub reason: Option<String>,
    pub payment_email: Option<String>,
}

impl AffiliateApplication {
    pub fn new(user_id: String, fields: &ApplicationFields) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            company_name: fields.company_name.clone(),
            website_url: fields.website_url.clone(),
            promotion_method: fields.promotion_method.clone(),
            expected_referrals: fields.expected_referrals.clone(),
            reason: fields.reason.clone(),
            payment_email: fields.payment_email.clone(),
            status: ApplicationStatus::Pending.as_str().to_string(),
            admin_notes: None,
            approved_by: None,
            decided_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status.parse().unwrap_or(ApplicationStatus::Pending)
    }
}

// total_referrals is lifetime; dashboard_referral_count only counts the capped dashboard action.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AffiliateProfile {
    pub id: String,
    pub user_id: String,
    pub affiliate_code: String,
    pub company_name: String,
    pub website_url: Option<String>,
    pub description: Option<String>,
    pub payment_email: Option<String>,
    pub status: String,
    pub commission_rate: i32,
    pub total_referrals: i32,
    pub successful_referrals: i32,
    pub pending_referrals: i32,
    pub dashboard_referral_count: i32,
    pub total_commission: i64,
    pub pending_commission: i64,
    pub paid_commission: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AffiliateProfile {
    pub fn new(user_id: String, fields: &ApplicationFields, commission_rate: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            affiliate_code: affiliate_code_for(&user_id),
            user_id,
            company_name: fields.company_name.clone(),
            website_url: fields.website_url.clone(),
            description: fields.reason.clone().or_else(|| Some(fields.promotion_method.clone())),
            payment_email: fields.payment_email.clone(),
            status: ProfileStatus::Pending.as_str().to_string(),
            commission_rate,
            total_referrals: 0,
            successful_referrals: 0,
            pending_referrals: 0,
            dashboard_referral_count: 0,
            total_commission: 0,
            pending_commission: 0,
            paid_commission: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ProfileStatus {
        self.status.parse().unwrap_or(ProfileStatus::Pending)
    }

    pub fn can_refer(&self) -> bool {
        self.status() == ProfileStatus::Approved && self.dashboard_referral_count < DASHBOARD_REFERRAL_CAP
    }

    pub fn counters_consistent(&self) -> bool {
        self.total_referrals == self.successful_referrals + self.pending_referrals
            && self.total_commission == self.pending_commission + self.paid_commission
    }
}

pub fn affiliate_code_for(user_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("AFF{}", digest[..8].to_uppercase())
}

pub const REFERRAL_SOURCE_SIGNUP: &str = "signup";
pub const REFERRAL_SOURCE_DASHBOARD: &str = "dashboard";
pub const REFERRAL_PENDING: &str = "pending";
pub const REFERRAL_CONVERTED: &str = "converted";
pub const COMMISSION_PENDING: &str = "pending";
pub const COMMISSION_PAID: &str = "paid";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Referral {
    pub id: String,
    pub affiliate_id: String,
    pub referred_user_id: Option<String>,
    pub referee_name: String,
    pub referee_email: String,
    pub source: String,
    pub status: String,
    pub payment_amount: Option<i64>,
    pub commission_amount: Option<i64>,
    pub commission_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub converted_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Referral {
    pub fn new(affiliate_id: String, referred_user_id: Option<String>, name: String, email: String, source: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            affiliate_id,
            referred_user_id,
            referee_name: name,
            referee_email: email,
            source: source.to_string(),
            status: REFERRAL_PENDING.to_string(),
            payment_amount: None,
            commission_amount: None,
            commission_status: None,
            created_at: Utc::now(),
            converted_at: None,
            paid_at: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AffiliatePayout {
    pub id: String,
    pub affiliate_id: String,
    pub amount: i64,
    pub paid_by: String,
    pub created_at: DateTime<Utc>,
}

impl AffiliatePayout {
    pub fn new(affiliate_id: String, amount: i64, paid_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            affiliate_id,
            amount,
            paid_by,
            created_at: Utc::now(),
        }
    }
}

/// Commission owed on a payment, floored to whole minor units.
pub fn commission_for(payment_amount: i64, commission_rate: i32) -> Result<i64, AppError> {
    payment_amount
        .checked_mul(i64::from(commission_rate))
        .map(|scaled| scaled / 100)
        .ok_or_else(|| AppError::Validation("Payment amount is too large".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ApplicationFields {
        ApplicationFields {
            company_name: "Rao & Co".into(),
            website_url: Some("https://raoandco.in".into()),
            promotion_method: "Newsletter".into(),
            expected_referrals: Some("10-25".into()),
            reason: None,
            payment_email: None,
        }
    }

    #[test]
    fn test_affiliate_code_is_stable_and_shaped() {
        let a = affiliate_code_for("5f1c2e7a-0000-4000-8000-000000000001");
        let b = affiliate_code_for("5f1c2e7a-0000-4000-8000-000000000001");
        assert_eq!(a, b);
        assert_eq!(a.len(), 11);
        assert!(a.starts_with("AFF"));
        assert!(a[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(a, affiliate_code_for("another-user"));
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!("approve".parse::<Decision>().unwrap(), Decision::Approve);
        assert_eq!("rejected".parse::<Decision>().unwrap(), Decision::Reject);
        assert!("pending".parse::<Decision>().is_err());
    }

    #[test]
    fn test_profile_transitions() {
        assert!(ProfileStatus::Pending.can_transition_to(ProfileStatus::Approved));
        assert!(ProfileStatus::Approved.can_transition_to(ProfileStatus::Suspended));
        assert!(ProfileStatus::Suspended.can_transition_to(ProfileStatus::Approved));
        assert!(!ProfileStatus::Approved.can_transition_to(ProfileStatus::Pending));
        assert!(!ProfileStatus::Approved.can_transition_to(ProfileStatus::Approved));
    }

    #[test]
    fn test_can_refer_requires_approval_and_free_slot() {
        let mut profile = AffiliateProfile::new("u1".into(), &fields(), 10);
        assert!(!profile.can_refer());

        profile.status = "approved".into();
        assert!(profile.can_refer());

        profile.dashboard_referral_count = 1;
        assert!(!profile.can_refer());
    }

    #[test]
    fn test_commission_floors() {
        assert_eq!(commission_for(99_900, 10).unwrap(), 9_990);
        assert_eq!(commission_for(999, 15).unwrap(), 149);
        assert_eq!(commission_for(0, 10).unwrap(), 0);
    }

    #[test]
    fn test_commission_overflow_is_rejected() {
        let err = commission_for(i64::MAX / 2, 10).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(commission_for(MAX_PAYMENT_AMOUNT, 100).unwrap(), MAX_PAYMENT_AMOUNT);
    }

    #[test]
    fn test_counters_consistent_tracks_both_balances() {
        let mut profile = AffiliateProfile::new("u1".into(), &fields(), 10);
        assert!(profile.counters_consistent());

        profile.total_referrals = 2;
        profile.pending_referrals = 1;
        profile.successful_referrals = 1;
        profile.total_commission = 500;
        profile.pending_commission = 200;
        profile.paid_commission = 300;
        assert!(profile.counters_consistent());

        profile.pending_referrals = 0;
        assert!(!profile.counters_consistent());
    }
}
