use crate::domain::{models::booking::{Booking, BookingStatus}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>("INSERT INTO bookings (id, name, email, phone, firm_name, date, time, message, status, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *").bind(&booking.id).bind(&booking.name).bind(&booking.email).bind(&booking.phone).bind(&booking.firm_name).bind(booking.date).bind(&booking.time).bind(&booking.message).bind(&booking.status).bind(booking.created_at).fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_booked_times(&self, date: NaiveDate) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>("SELECT time FROM bookings WHERE date = $1 AND status IN ('confirmed', 'pending') ORDER BY created_at ASC").bind(date).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self, date: Option<NaiveDate>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE ($1::date IS NULL OR date = $1) ORDER BY created_at DESC").bind(date).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = $1 WHERE id = $2 RETURNING *").bind(status.as_str()).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found".into()))
    }
}
