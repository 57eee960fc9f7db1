use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::RegistrationRequest;
use crate::error::AppError;
use serde_json::json;
use std::sync::Arc;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.affiliates()?.register_user(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "user": user }))))
}
