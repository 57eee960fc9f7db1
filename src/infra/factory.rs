use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::models::user::ROLE_ADMIN;
use crate::domain::ports::{CrmClient, EmailService};
use crate::domain::services::notification::load_templates;
use crate::error::AppError;
use crate::state::{AppState, Repositories};
use crate::infra::crm::hubspot_client::HubspotClient;
use crate::infra::email::resend_email_service::ResendEmailService;
use crate::infra::repositories::{
    postgres_affiliate_repo::PostgresAffiliateRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_user_repo::PostgresUserRepo,
    sqlite_affiliate_repo::SqliteAffiliateRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_user_repo::SqliteUserRepo,
};

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let email_service: Option<Arc<dyn EmailService>> = match &config.resend_api_key {
        Some(key) => Some(Arc::new(ResendEmailService::new(
            config.resend_api_url.clone(),
            key.clone(),
            config.mail_from.clone(),
        ))),
        None => {
            warn!("RESEND_API_KEY not set, confirmation emails are disabled");
            None
        }
    };

    let crm_client: Option<Arc<dyn CrmClient>> = config.hubspot_access_token.as_ref().map(|token| {
        Arc::new(HubspotClient::new(config.hubspot_api_url.clone(), token.clone())) as Arc<dyn CrmClient>
    });
    if crm_client.is_none() {
        info!("HUBSPOT_ACCESS_TOKEN not set, CRM sync is disabled");
    }

    let templates = Arc::new(load_templates()?);

    let repos = match config.configured_database_url() {
        None => {
            warn!("DATABASE_URL missing or placeholder, bookings will not be stored");
            None
        }
        Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
            Some(connect_postgres(url).await?)
        }
        Some(url) => Some(connect_sqlite(url).await?),
    };

    if let (Some(repos), Some(admin_email)) = (&repos, &config.admin_email) {
        promote_admin(repos, admin_email).await?;
    }

    Ok(AppState::new(config.clone(), repos, email_service, crm_client, templates))
}

async fn connect_postgres(database_url: &str) -> Result<Repositories, AppError> {
    info!("Initializing PostgreSQL connection...");

    let mut opts: PgConnectOptions = database_url.parse().map_err(AppError::Database)?;
    opts = opts.log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(opts)
        .await
        .map_err(AppError::Database)?;

    run_postgres_migrations(&pool).await?;

    Ok(Repositories {
        booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
        user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
        affiliate_repo: Arc::new(PostgresAffiliateRepo::new(pool)),
    })
}

async fn connect_sqlite(database_url: &str) -> Result<Repositories, AppError> {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(AppError::Database)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .map_err(AppError::Database)?;

    run_sqlite_migrations(&pool).await?;

    Ok(Repositories {
        booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
        user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
        affiliate_repo: Arc::new(SqliteAffiliateRepo::new(pool)),
    })
}

pub async fn promote_admin(repos: &Repositories, admin_email: &str) -> Result<(), AppError> {
    match repos.user_repo.find_by_email(admin_email).await? {
        Some(user) if user.is_admin() => {}
        Some(user) => {
            repos.user_repo.set_role(&user.id, ROLE_ADMIN).await?;
            info!("Promoted {} to admin", user.email);
        }
        None => warn!("ADMIN_EMAIL {} has no account yet; register it and restart", admin_email),
    }
    Ok(())
}

async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to run Postgres migrations: {}", e)))
}

async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to run SQLite migrations: {}", e)))
}
