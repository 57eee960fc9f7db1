use crate::domain::{models::{affiliate::Referral, user::User}, ports::UserRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::error;

pub struct PostgresUserRepo {
    pool: PgPool,
}

impl PostgresUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepo {
    async fn create_with_referral(&self, user: &User, referral: Option<&Referral>) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, User>("INSERT INTO users (id, name, email, phone, role, affiliate_id, referred_by, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *").bind(&user.id).bind(&user.name).bind(&user.email).bind(&user.phone).bind(&user.role).bind(&user.affiliate_id).bind(&user.referred_by).bind(user.created_at).fetch_one(&mut *tx).await.map_err(AppError::Database)?;
        if let Some(r) = referral {
            sqlx::query("INSERT INTO referrals (id, affiliate_id, referred_user_id, referee_name, referee_email, source, status, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)").bind(&r.id).bind(&r.affiliate_id).bind(&r.referred_user_id).bind(&r.referee_name).bind(&r.referee_email).bind(&r.source).bind(&r.status).bind(r.created_at).execute(&mut *tx).await.map_err(AppError::Database)?;
            sqlx::query("UPDATE affiliate_profiles SET total_referrals = total_referrals + 1, pending_referrals = pending_referrals + 1, updated_at = $1 WHERE id = $2").bind(Utc::now()).bind(&r.affiliate_id).execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)").bind(email).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn set_role(&self, id: &str, role: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2").bind(role).bind(id).execute(&self.pool).await.map_err(|e| {
            error!("Postgres role update failed: {:?}", e);
            AppError::Database(e)
        })?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("User not found".into())); }
        Ok(())
    }
}
