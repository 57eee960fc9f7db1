use practice_backend::{
    api::router::create_router,
    state::{AppState, Repositories},
    config::Config,
    infra::repositories::{
        sqlite_affiliate_repo::SqliteAffiliateRepo,
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    domain::models::user::ROLE_ADMIN,
    domain::ports::{CrmClient, CrmContact, EmailService, OutgoingEmail},
    domain::services::notification::load_templates,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::{json, Value};

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockCrmClient {
    pub contacts: Mutex<Vec<CrmContact>>,
}

#[async_trait]
impl CrmClient for MockCrmClient {
    async fn upsert_contact(&self, contact: &CrmContact) -> Result<(), AppError> {
        self.contacts.lock().unwrap().push(contact.clone());
        Ok(())
    }
}

pub fn test_config(database_url: Option<String>) -> Config {
    Config {
        database_url,
        port: 0,
        resend_api_key: Some("test-key".to_string()),
        resend_api_url: "http://localhost".to_string(),
        mail_from: "Demo <demo@example.in>".to_string(),
        team_email: "team@example.in".to_string(),
        hubspot_access_token: None,
        hubspot_api_url: "http://localhost".to_string(),
        business_timezone: "Asia/Kolkata".to_string(),
        site_url: "http://localhost:5173".to_string(),
        allowed_origins: vec!["http://localhost:5173".to_string(), "https://www.example.in".to_string()],
        admin_email: None,
        degraded_alert_threshold: 5,
        default_commission_rate: 10,
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Option<Pool<Sqlite>>,
    pub db_filename: Option<String>,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
    pub crm: Arc<MockCrmClient>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let repos = Repositories {
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            affiliate_repo: Arc::new(SqliteAffiliateRepo::new(pool.clone())),
        };

        Self::build(test_config(Some(db_url)), Some(repos), Some(pool), Some(db_filename))
    }

    /// No database at all: bookings degrade, affiliate routes answer 503.
    pub async fn unconfigured() -> Self {
        Self::build(test_config(None), None, None, None)
    }

    fn build(config: Config, repos: Option<Repositories>, pool: Option<Pool<Sqlite>>, db_filename: Option<String>) -> Self {
        let email = Arc::new(MockEmailService::default());
        let crm = Arc::new(MockCrmClient::default());

        let state = Arc::new(AppState::new(
            config,
            repos,
            Some(email.clone() as Arc<dyn EmailService>),
            Some(crm.clone() as Arc<dyn CrmClient>),
            Arc::new(load_templates().unwrap()),
        ));

        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, email, crm }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        self.pool.as_ref().expect("test app has no database")
    }

    pub async fn send(&self, method: &str, uri: &str, user_id: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user_id {
            builder = builder.header("X-User-Id", id);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Registers a user through the API and returns its id.
    pub async fn register(&self, name: &str, email: &str) -> String {
        let res = self.send("POST", "/api/registrations", None, Some(json!({ "name": name, "email": email }))).await;
        assert!(res.status().is_success(), "registration failed: {}", res.status());
        parse_body(res).await["user"]["id"].as_str().unwrap().to_string()
    }

    pub async fn register_admin(&self, email: &str) -> String {
        let id = self.register("Ops Admin", email).await;
        self.state.repos().unwrap().user_repo.set_role(&id, ROLE_ADMIN).await.unwrap();
        id
    }

    /// Registers a user, submits the dashboard application and has `admin_id` approve it.
    /// Returns (user id, profile id, affiliate code).
    pub async fn approved_affiliate(&self, admin_id: &str, email: &str) -> (String, String, String) {
        let user_id = self.register("Asha Rao", email).await;

        let res = self.send("POST", "/api/affiliate/profile/apply", Some(&user_id), Some(application_body())).await;
        assert_eq!(res.status().as_u16(), 201);
        let body = parse_body(res).await;
        let application_id = body["application"]["id"].as_str().unwrap().to_string();

        let res = self.send("PUT", "/api/admin/affiliates", Some(admin_id), Some(json!({
            "applicationId": application_id,
            "status": "approved",
            "adminNotes": "Welcome aboard",
            "approvedBy": "ops@example.in"
        }))).await;
        assert_eq!(res.status().as_u16(), 200);

        let profile = self.state.repos().unwrap().affiliate_repo.find_profile_by_user(&user_id).await.unwrap().unwrap();
        (user_id, profile.id, profile.affiliate_code)
    }
}

#[allow(dead_code)]
pub fn application_body() -> Value {
    json!({
        "companyName": "Rao & Co",
        "websiteUrl": "raoandco.in",
        "promotionMethod": "Weekly newsletter for practising CAs",
        "expectedReferrals": "11-25",
        "reason": "Our readers keep asking which practice software to use, and we want to recommend one."
    })
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(file) = &self.db_filename {
            let _ = std::fs::remove_file(file);
            let _ = std::fs::remove_file(format!("{}-wal", file));
            let _ = std::fs::remove_file(format!("{}-shm", file));
        }
    }
}
