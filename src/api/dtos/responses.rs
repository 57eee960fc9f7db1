use crate::domain::models::affiliate::{AffiliateApplication, AffiliateProfile};
use crate::domain::models::booking::Booking;
use crate::domain::services::monitor::DegradedWriteStats;
use serde::Serialize;

#[derive(Serialize)]
pub struct BookingSummary {
    pub id: String,
    pub date: String,
    pub time: String,
}

impl From<&Booking> for BookingSummary {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id.clone(),
            date: b.display_date(),
            time: b.time.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub message: String,
    pub booking: BookingSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedSlotsResponse {
    pub booked_slots: Vec<String>,
}

#[derive(Serialize)]
pub struct AffiliateOverview {
    pub profile: Option<AffiliateProfile>,
    pub application: Option<AffiliateApplication>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub degraded_writes: DegradedWriteStats,
}
