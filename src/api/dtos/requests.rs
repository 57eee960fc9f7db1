use crate::domain::services::affiliate_ledger::{ApplicationInput, QuickApplicationInput, RegistrationInput};
use crate::domain::services::booking_ledger::BookingInput;
use serde::Deserialize;

// Form fields are optional at the serde level so a missing field reaches
// validation and comes back as a 400 with a readable message.

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub firm_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
}

impl From<CreateBookingRequest> for BookingInput {
    fn from(req: CreateBookingRequest) -> Self {
        BookingInput {
            name: req.name,
            email: req.email,
            phone: req.phone,
            firm_name: req.firm_name,
            date: req.date,
            time: req.time,
            message: req.message,
        }
    }
}

#[derive(Deserialize)]
pub struct BookedSlotsQuery {
    pub date: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuickApplicationRequest {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub account_email: Option<String>,
    pub payment_email: Option<String>,
    pub promotion_method: Option<String>,
    pub website_url: Option<String>,
}

impl From<QuickApplicationRequest> for QuickApplicationInput {
    fn from(req: QuickApplicationRequest) -> Self {
        QuickApplicationInput {
            user_id: req.user_id,
            name: req.name,
            account_email: req.account_email,
            payment_email: req.payment_email,
            promotion_method: req.promotion_method,
            website_url: req.website_url,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub company_name: Option<String>,
    pub website_url: Option<String>,
    pub promotion_method: Option<String>,
    pub expected_referrals: Option<String>,
    pub reason: Option<String>,
    pub payment_email: Option<String>,
}

impl From<ApplicationRequest> for ApplicationInput {
    fn from(req: ApplicationRequest) -> Self {
        ApplicationInput {
            company_name: req.company_name,
            website_url: req.website_url,
            promotion_method: req.promotion_method,
            expected_referrals: req.expected_referrals,
            reason: req.reason,
            payment_email: req.payment_email,
        }
    }
}

#[derive(Deserialize)]
pub struct ReferContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub referral_code: Option<String>,
}

impl From<RegistrationRequest> for RegistrationInput {
    fn from(req: RegistrationRequest) -> Self {
        RegistrationInput {
            name: req.name,
            email: req.email,
            phone: req.phone,
            role: req.role,
            referral_code: req.referral_code,
        }
    }
}

#[derive(Deserialize)]
pub struct ApplicationsQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideApplicationRequest {
    pub application_id: String,
    pub status: String,
    pub admin_notes: Option<String>,
    pub approved_by: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct BookingsQuery {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct ConversionRequest {
    /// Payment in paise.
    pub amount: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub paid_by: Option<String>,
}
