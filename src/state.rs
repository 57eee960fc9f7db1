use std::sync::Arc;
use crate::domain::ports::{AffiliateRepository, BookingRepository, CrmClient, EmailService, UserRepository};
use crate::domain::services::{
    affiliate_ledger::AffiliateLedger, booking_ledger::BookingLedger, commission_ledger::CommissionLedger,
    crm_dispatch::CrmDispatcher, monitor::DegradedWriteMonitor, notification::Notifier,
};
use crate::config::Config;
use crate::error::AppError;
use tera::Tera;

#[derive(Clone)]
pub struct Repositories {
    pub booking_repo: Arc<dyn BookingRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub affiliate_repo: Arc<dyn AffiliateRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repos: Option<Repositories>,
    pub bookings: Arc<BookingLedger>,
    affiliates: Option<Arc<AffiliateLedger>>,
    commissions: Option<Arc<CommissionLedger>>,
    pub monitor: Arc<DegradedWriteMonitor>,
}

impl AppState {
    pub fn new(
        config: Config,
        repos: Option<Repositories>,
        email_service: Option<Arc<dyn EmailService>>,
        crm_client: Option<Arc<dyn CrmClient>>,
        templates: Arc<Tera>,
    ) -> Self {
        let notifier = Arc::new(Notifier::new(
            email_service,
            templates,
            config.team_email.clone(),
            config.business_timezone.clone(),
            config.site_url.clone(),
        ));
        let crm = CrmDispatcher::new(crm_client);
        let monitor = Arc::new(DegradedWriteMonitor::new(config.degraded_alert_threshold));

        let bookings = Arc::new(BookingLedger::new(
            repos.as_ref().map(|r| r.booking_repo.clone()),
            notifier.clone(),
            crm.clone(),
            monitor.clone(),
        ));

        let affiliates = repos.as_ref().map(|r| Arc::new(AffiliateLedger::new(
            r.affiliate_repo.clone(),
            r.user_repo.clone(),
            notifier.clone(),
            crm.clone(),
            config.default_commission_rate,
        )));
        let commissions = repos.as_ref().map(|r| Arc::new(CommissionLedger::new(r.affiliate_repo.clone())));

        Self { config, repos, bookings, affiliates, commissions, monitor }
    }

    pub fn database_configured(&self) -> bool {
        self.repos.is_some()
    }

    pub fn repos(&self) -> Result<&Repositories, AppError> {
        self.repos.as_ref().ok_or_else(unconfigured)
    }

    pub fn affiliates(&self) -> Result<&AffiliateLedger, AppError> {
        self.affiliates.as_deref().ok_or_else(unconfigured)
    }

    pub fn commissions(&self) -> Result<&CommissionLedger, AppError> {
        self.commissions.as_deref().ok_or_else(unconfigured)
    }
}

fn unconfigured() -> AppError {
    AppError::Configuration("Database is not configured".into())
}
