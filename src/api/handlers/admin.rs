use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminUser;
use crate::api::dtos::requests::{
    ApplicationsQuery, BookingsQuery, ConversionRequest, DecideApplicationRequest, PayoutRequest, StatusUpdateRequest,
};
use crate::error::AppError;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub async fn list_applications(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ApplicationsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let applications = state.affiliates()?.list_applications(query.status.as_deref()).await?;
    Ok(Json(json!({ "applications": applications })))
}

pub async fn decide_application(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<DecideApplicationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let decided_by = payload.approved_by.clone().unwrap_or_else(|| admin.email.clone());
    info!("decide_application: {} -> {} by {}", payload.application_id, payload.status, decided_by);

    let application = state.affiliates()?
        .decide_application(&payload.application_id, &payload.status, payload.admin_notes.as_deref(), &decided_by)
        .await?;

    Ok(Json(json!({ "success": true, "application": application })))
}

pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let profiles = state.affiliates()?.list_profiles().await?;
    Ok(Json(json!({ "profiles": profiles })))
}

pub async fn update_profile_status(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(profile_id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.affiliates()?.update_profile_status(&profile_id, &payload.status).await?;
    Ok(Json(json!({ "success": true, "profile": profile })))
}

pub async fn list_referrals(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(affiliate_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let referrals = state.affiliates()?.list_referrals(&affiliate_id).await?;
    Ok(Json(json!({ "referrals": referrals })))
}

pub async fn record_conversion(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(referral_id): Path<String>,
    Json(payload): Json<ConversionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (referral, profile) = state.commissions()?.record_conversion(&referral_id, payload.amount).await?;
    Ok(Json(json!({ "success": true, "referral": referral, "profile": profile })))
}

pub async fn create_payout(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(affiliate_id): Path<String>,
    Json(payload): Json<PayoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let paid_by = payload.paid_by.unwrap_or(admin.email);
    let (payout, profile) = state.commissions()?.pay_out(&affiliate_id, Some(&paid_by)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "payout": payout, "profile": profile }))))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<BookingsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.bookings.list_bookings(query.date.as_deref()).await?;
    Ok(Json(json!({ "bookings": bookings })))
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.bookings.update_status(&booking_id, &payload.status).await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

pub async fn list_registrations(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let users = state.repos()?.user_repo.list().await?;
    Ok(Json(json!({ "registrations": users })))
}
