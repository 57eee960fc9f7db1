use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Pending => "pending",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn occupies_slot(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Pending)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "pending" => Ok(BookingStatus::Pending),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub firm_name: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub firm_name: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub message: Option<String>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), params, Utc::now())
    }

    pub fn synthetic(params: NewBookingParams) -> Self {
        let now = Utc::now();
        Self::with_id(format!("BK{}", now.timestamp_millis()), params, now)
    }

    fn with_id(id: String, params: NewBookingParams, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: params.name,
            email: params.email,
            phone: params.phone,
            firm_name: params.firm_name,
            date: params.date,
            time: params.time,
            message: params.message,
            status: BookingStatus::Confirmed.as_str().to_string(),
            created_at,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.id.starts_with("BK")
    }

    /// `M/D/YYYY`, the short US form the booking widget renders.
    pub fn display_date(&self) -> String {
        use chrono::Datelike;
        format!("{}/{}/{}", self.date.month(), self.date.day(), self.date.year())
    }

    fn params(&self) -> NewBookingParams {
        NewBookingParams {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            firm_name: self.firm_name.clone(),
            date: self.date,
            time: self.time.clone(),
            message: self.message.clone(),
        }
    }

    pub fn into_synthetic(self) -> Self {
        Self::synthetic(self.params())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NewBookingParams {
        NewBookingParams {
            name: "Asha Rao".into(),
            email: "asha@x.com".into(),
            phone: "9999999999".into(),
            firm_name: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            time: "10:00 AM".into(),
            message: None,
        }
    }

    #[test]
    fn test_synthetic_booking_id_is_bk_millis() {
        let booking = Booking::synthetic(params());
        assert!(booking.is_synthetic());
        assert!(booking.id[2..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(booking.status, "confirmed");
    }

    #[test]
    fn test_display_date_has_no_padding() {
        let booking = Booking::new(params());
        assert!(!booking.is_synthetic());
        assert_eq!(booking.display_date(), "3/10/2025");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Pending".parse::<BookingStatus>().unwrap(), BookingStatus::Pending);
        assert!(BookingStatus::Confirmed.occupies_slot());
        assert!(!BookingStatus::Cancelled.occupies_slot());
        assert!("archived".parse::<BookingStatus>().is_err());
    }
}
