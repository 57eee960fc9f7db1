use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, affiliate, booking, health, registration};
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info_span, Span, error, info, warn};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))

        // Demo booking
        .route("/api/bookings", post(booking::create_booking).get(booking::get_booked_slots))

        // Registration
        .route("/api/registrations", post(registration::register))

        // Affiliate
        .route("/api/affiliate/apply", post(affiliate::apply))
        .route("/api/affiliate/profile/apply", post(affiliate::apply_profile))
        .route("/api/affiliate/profile", get(affiliate::get_profile))
        .route("/api/affiliate/referral-status", get(affiliate::referral_status))
        .route("/api/affiliate/referrals", post(affiliate::refer_contact))

        // Admin
        .route("/api/admin/affiliates", get(admin::list_applications).put(admin::decide_application))
        .route("/api/admin/affiliates/profiles", get(admin::list_profiles))
        .route("/api/admin/affiliates/profiles/{id}/status", put(admin::update_profile_status))
        .route("/api/admin/affiliates/{id}/referrals", get(admin::list_referrals))
        .route("/api/admin/affiliates/{id}/payouts", post(admin::create_payout))
        .route("/api/admin/referrals/{id}/conversion", post(admin::record_conversion))
        .route("/api/admin/bookings", get(admin::list_bookings))
        .route("/api/admin/bookings/{id}/status", put(admin::update_booking_status))
        .route("/api/admin/registrations", get(admin::list_registrations))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let origin = if allowed.is_empty() {
        warn!("No valid CORS origins configured, allowing any origin");
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-user-id")])
        .max_age(Duration::from_secs(3600))
}

