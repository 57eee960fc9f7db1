use crate::domain::models::booking::{Booking, BookingStatus, NewBookingParams};
use crate::domain::ports::{BookingRepository, CrmContact};
use crate::domain::services::crm_dispatch::CrmDispatcher;
use crate::domain::services::monitor::DegradedWriteMonitor;
use crate::domain::services::notification::Notifier;
use crate::domain::services::validation::{self, MAX_LONG_TEXT, MAX_SHORT_TEXT, MAX_SLOT_LABEL};
use crate::error::AppError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct BookingInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub firm_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedCause {
    Unconfigured,
    WriteFailed(String),
}

impl DegradedCause {
    pub fn label(&self) -> &'static str {
        match self {
            DegradedCause::Unconfigured => "unconfigured",
            DegradedCause::WriteFailed(_) => "write_failed",
        }
    }
}

impl fmt::Display for DegradedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedCause::Unconfigured => write!(f, "database not configured"),
            DegradedCause::WriteFailed(reason) => write!(f, "insert failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DegradedWrite {
    pub booking: Booking,
    pub cause: DegradedCause,
}

impl DegradedWrite {
    pub fn into_booking(self) -> Booking {
        self.booking
    }
}

pub type BookingOutcome = Result<Booking, DegradedWrite>;

pub struct BookingLedger {
    repo: Option<Arc<dyn BookingRepository>>,
    notifier: Arc<Notifier>,
    crm: CrmDispatcher,
    monitor: Arc<DegradedWriteMonitor>,
}

impl BookingLedger {
    pub fn new(
        repo: Option<Arc<dyn BookingRepository>>,
        notifier: Arc<Notifier>,
        crm: CrmDispatcher,
        monitor: Arc<DegradedWriteMonitor>,
    ) -> Self {
        Self { repo, notifier, crm, monitor }
    }

    pub async fn create_booking(&self, input: BookingInput) -> Result<BookingOutcome, AppError> {
        let params = Self::validate(input)?;

        let outcome = match &self.repo {
            None => {
                warn!("Database not configured, booking confirmed without storage");
                Err(DegradedWrite {
                    booking: Booking::synthetic(params),
                    cause: DegradedCause::Unconfigured,
                })
            }
            Some(repo) => {
                let booking = Booking::new(params);
                match repo.create(&booking).await {
                    Ok(saved) => Ok(saved),
                    Err(e) if e.is_unique_violation() || matches!(e, AppError::Conflict(_)) => {
                        info!("Slot {} {} already taken", booking.date, booking.time);
                        return Err(AppError::Conflict("This time slot is already booked".into()));
                    }
                    Err(e) => {
                        error!("Booking insert failed, confirming without storage: {}", e);
                        Err(DegradedWrite {
                            booking: booking.into_synthetic(),
                            cause: DegradedCause::WriteFailed(e.to_string()),
                        })
                    }
                }
            }
        };

        let booking = match &outcome {
            Ok(booking) => {
                self.monitor.record_durable();
                info!("Booking {} stored for {} {}", booking.id, booking.date, booking.time);
                booking
            }
            Err(degraded) => {
                self.monitor.record_degraded(degraded.cause.label());
                warn!("Booking {} is degraded: {}", degraded.booking.id, degraded.cause);
                &degraded.booking
            }
        };

        self.notifier.send_booking_confirmation(booking, outcome.is_ok()).await;
        self.crm.sync_contact(CrmContact {
            email: booking.email.clone(),
            name: booking.name.clone(),
            phone: Some(booking.phone.clone()),
            company: booking.firm_name.clone(),
            lifecycle_stage: "lead".into(),
            source: "demo_booking".into(),
        });

        Ok(outcome)
    }

    /// Time labels already taken on `date`. Fails open: any backend problem yields `[]`.
    pub async fn booked_slots(&self, date: Option<&str>) -> Result<Vec<String>, AppError> {
        let raw = validation::required("Date", date, MAX_SHORT_TEXT)?;
        let date = validation::booking_date(&raw)?;

        let Some(repo) = &self.repo else {
            return Ok(vec![]);
        };

        match repo.list_booked_times(date).await {
            Ok(slots) => Ok(slots),
            Err(e) => {
                warn!("Booked slots lookup failed for {}, returning none: {}", date, e);
                Ok(vec![])
            }
        }
    }

    pub async fn list_bookings(&self, date: Option<&str>) -> Result<Vec<Booking>, AppError> {
        let date = match validation::optional(date, MAX_SHORT_TEXT) {
            Some(raw) => Some(validation::booking_date(&raw)?),
            None => None,
        };
        self.stored()?.list(date).await
    }

    pub async fn update_status(&self, id: &str, status: &str) -> Result<Booking, AppError> {
        let status = BookingStatus::from_str(status).map_err(AppError::Validation)?;
        let updated = self.stored()?.update_status(id, status).await?;
        info!("Booking {} is now {}", updated.id, status);
        Ok(updated)
    }

    fn stored(&self) -> Result<&Arc<dyn BookingRepository>, AppError> {
        self.repo
            .as_ref()
            .ok_or_else(|| AppError::Configuration("Database is not configured".into()))
    }

    fn validate(input: BookingInput) -> Result<NewBookingParams, AppError> {
        let name = validation::required("Name", input.name.as_deref(), MAX_SHORT_TEXT)?;
        let email = validation::required("Email", input.email.as_deref(), MAX_SHORT_TEXT)?;
        let phone = validation::required("Phone", input.phone.as_deref(), MAX_SHORT_TEXT)?;
        let date = validation::required("Date", input.date.as_deref(), MAX_SHORT_TEXT)?;
        let time = validation::required("Time", input.time.as_deref(), MAX_SHORT_TEXT)?;
        validation::max_chars("Time", &time, MAX_SLOT_LABEL)?;

        Ok(NewBookingParams {
            name,
            email: validation::email("Email", &email)?,
            phone: validation::phone(&phone)?,
            firm_name: validation::optional(input.firm_name.as_deref(), MAX_SHORT_TEXT),
            date: validation::booking_date(&date)?,
            time,
            message: validation::optional(input.message.as_deref(), MAX_LONG_TEXT),
        })
    }
}
