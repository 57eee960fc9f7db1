use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::current_user::CurrentUser;
use crate::api::dtos::requests::{ApplicationRequest, QuickApplicationRequest, ReferContactRequest};
use crate::api::dtos::responses::AffiliateOverview;
use crate::domain::services::affiliate_ledger::SubmissionOutcome;
use crate::error::AppError;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

fn submission_response(outcome: SubmissionOutcome) -> impl IntoResponse {
    let status = if outcome.already_pending { StatusCode::OK } else { StatusCode::CREATED };
    let message = if outcome.already_pending {
        "You already have a pending application"
    } else {
        "Application submitted"
    };
    (
        status,
        Json(json!({
            "success": true,
            "message": message,
            "alreadyPending": outcome.already_pending,
            "application": outcome.application,
            "profile": outcome.profile,
        })),
    )
}

pub async fn apply(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QuickApplicationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.affiliates()?.submit_quick_application(payload.into()).await?;
    info!("apply: application {} (already pending: {})", outcome.application.id, outcome.already_pending);
    Ok(submission_response(outcome))
}

pub async fn apply_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ApplicationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.affiliates()?.submit_application(&user, payload.into()).await?;
    info!("apply_profile: application {} (already pending: {})", outcome.application.id, outcome.already_pending);
    Ok(submission_response(outcome))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let (profile, application) = state.affiliates()?.profile_for(&user).await?;
    Ok(Json(AffiliateOverview { profile, application }))
}

pub async fn referral_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let status = state.affiliates()?.referral_status(&user).await?;
    Ok(Json(status))
}

pub async fn refer_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ReferContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    let referral = state.affiliates()?
        .refer_contact(&user, payload.name.as_deref(), payload.email.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "referral": referral }))))
}
