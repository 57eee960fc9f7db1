use crate::domain::models::affiliate::{
    commission_for, AffiliateApplication, AffiliatePayout, AffiliateProfile, Decision, ProfileStatus, Referral,
    COMMISSION_PAID, COMMISSION_PENDING, DASHBOARD_REFERRAL_CAP, REFERRAL_CONVERTED, REFERRAL_PENDING,
};
use crate::domain::models::user::{ROLE_ADMIN, ROLE_AFFILIATE};
use crate::domain::ports::{AffiliateRepository, Submission};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

pub struct SqliteAffiliateRepo {
    pool: SqlitePool,
}

impl SqliteAffiliateRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn promote_to_affiliate(tx: &mut Transaction<'_, Sqlite>, profile_id: &str, user_id: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET affiliate_id = ?, role = CASE WHEN role = ? THEN role ELSE ? END WHERE id = ?")
        .bind(profile_id)
        .bind(ROLE_ADMIN)
        .bind(ROLE_AFFILIATE)
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;
    Ok(())
}

#[async_trait]
impl AffiliateRepository for SqliteAffiliateRepo {
    async fn latest_application(&self, user_id: &str) -> Result<Option<AffiliateApplication>, AppError> {
        sqlx::query_as::<_, AffiliateApplication>(
            "SELECT * FROM affiliate_applications WHERE user_id = ? ORDER BY created_at DESC LIMIT 1"
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn submit_application(&self, application: &AffiliateApplication, profile: &AffiliateProfile) -> Result<Submission, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let pending = sqlx::query_as::<_, AffiliateApplication>(
            "SELECT * FROM affiliate_applications WHERE user_id = ? AND status = 'pending' ORDER BY created_at DESC LIMIT 1"
        )
            .bind(&application.user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if let Some(existing) = pending {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(Submission::AlreadyPending(existing));
        }

        let created = sqlx::query_as::<_, AffiliateApplication>(
            "INSERT INTO affiliate_applications (id, user_id, company_name, website_url, promotion_method, expected_referrals, reason, payment_email, status, admin_notes, approved_by, decided_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&application.id).bind(&application.user_id).bind(&application.company_name).bind(&application.website_url)
            .bind(&application.promotion_method).bind(&application.expected_referrals).bind(&application.reason)
            .bind(&application.payment_email).bind(&application.status).bind(&application.admin_notes)
            .bind(&application.approved_by).bind(application.decided_at).bind(application.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        let upserted = sqlx::query_as::<_, AffiliateProfile>(
            "INSERT INTO affiliate_profiles (id, user_id, affiliate_code, company_name, website_url, description, payment_email, status, commission_rate,
                total_referrals, successful_referrals, pending_referrals, dashboard_referral_count, total_commission, pending_commission, paid_commission, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, 0, 0, 0, 0, 0, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                company_name = excluded.company_name,
                website_url = excluded.website_url,
                description = excluded.description,
                payment_email = COALESCE(excluded.payment_email, affiliate_profiles.payment_email),
                status = 'pending',
                updated_at = excluded.updated_at
             RETURNING *"
        )
            .bind(&profile.id).bind(&profile.user_id).bind(&profile.affiliate_code).bind(&profile.company_name)
            .bind(&profile.website_url).bind(&profile.description).bind(&profile.payment_email).bind(&profile.status)
            .bind(profile.commission_rate).bind(profile.created_at).bind(profile.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Submission::Created { application: created, profile: upserted })
    }

    async fn list_applications(&self, status: Option<&str>) -> Result<Vec<AffiliateApplication>, AppError> {
        sqlx::query_as::<_, AffiliateApplication>(
            "SELECT * FROM affiliate_applications WHERE (? IS NULL OR status = ?) ORDER BY created_at DESC"
        )
            .bind(status)
            .bind(status)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn decide_application(&self, id: &str, decision: Decision, notes: Option<&str>, decided_by: &str) -> Result<AffiliateApplication, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let decided = sqlx::query_as::<_, AffiliateApplication>(
            "UPDATE affiliate_applications SET status = ?, admin_notes = ?, approved_by = ?, decided_at = ?
             WHERE id = ? AND status = 'pending'
             RETURNING *"
        )
            .bind(decision.target().as_str()).bind(notes).bind(decided_by).bind(Utc::now()).bind(id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let decided = match decided {
            Some(app) => app,
            None => {
                let exists = sqlx::query_scalar::<_, String>("SELECT status FROM affiliate_applications WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;
                return Err(match exists {
                    Some(status) => AppError::Conflict(format!("Application already {}", status)),
                    None => AppError::NotFound("Application not found".into()),
                });
            }
        };

        if decision == Decision::Approve {
            let profile_id = sqlx::query_scalar::<_, String>(
                "UPDATE affiliate_profiles SET status = 'approved', updated_at = ? WHERE user_id = ? RETURNING id"
            )
                .bind(Utc::now()).bind(&decided.user_id)
                .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
                .ok_or_else(|| AppError::InternalWithMsg(format!("Application {} has no affiliate profile", decided.id)))?;

            promote_to_affiliate(&mut tx, &profile_id, &decided.user_id).await?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(decided)
    }

    async fn find_profile(&self, id: &str) -> Result<Option<AffiliateProfile>, AppError> {
        sqlx::query_as::<_, AffiliateProfile>("SELECT * FROM affiliate_profiles WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_profile_by_user(&self, user_id: &str) -> Result<Option<AffiliateProfile>, AppError> {
        sqlx::query_as::<_, AffiliateProfile>("SELECT * FROM affiliate_profiles WHERE user_id = ?").bind(user_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_profile_by_code(&self, code: &str) -> Result<Option<AffiliateProfile>, AppError> {
        sqlx::query_as::<_, AffiliateProfile>("SELECT * FROM affiliate_profiles WHERE affiliate_code = ?").bind(code).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_profiles(&self) -> Result<Vec<AffiliateProfile>, AppError> {
        sqlx::query_as::<_, AffiliateProfile>("SELECT * FROM affiliate_profiles ORDER BY created_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_profile_status(&self, id: &str, status: ProfileStatus) -> Result<AffiliateProfile, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, AffiliateProfile>(
            "UPDATE affiliate_profiles SET status = ?, updated_at = ? WHERE id = ? RETURNING *"
        )
            .bind(status.as_str()).bind(Utc::now()).bind(id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Affiliate profile not found".into()))?;

        if status == ProfileStatus::Approved {
            promote_to_affiliate(&mut tx, &updated.id, &updated.user_id).await?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn record_dashboard_referral(&self, referral: &Referral) -> Result<Referral, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let claimed = sqlx::query(
            "UPDATE affiliate_profiles
             SET dashboard_referral_count = dashboard_referral_count + 1,
                 total_referrals = total_referrals + 1,
                 pending_referrals = pending_referrals + 1,
                 updated_at = ?
             WHERE id = ? AND status = 'approved' AND dashboard_referral_count < ?"
        )
            .bind(Utc::now()).bind(&referral.affiliate_id).bind(DASHBOARD_REFERRAL_CAP)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::Conflict("Referral limit reached".into()));
        }

        let created = sqlx::query_as::<_, Referral>(
            "INSERT INTO referrals (id, affiliate_id, referred_user_id, referee_name, referee_email, source, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&referral.id).bind(&referral.affiliate_id).bind(&referral.referred_user_id).bind(&referral.referee_name)
            .bind(&referral.referee_email).bind(&referral.source).bind(&referral.status).bind(referral.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn list_referrals(&self, affiliate_id: &str) -> Result<Vec<Referral>, AppError> {
        sqlx::query_as::<_, Referral>("SELECT * FROM referrals WHERE affiliate_id = ? ORDER BY created_at DESC")
            .bind(affiliate_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn convert_referral(&self, referral_id: &str, payment_amount: i64) -> Result<(Referral, AffiliateProfile), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let referral = sqlx::query_as::<_, Referral>("SELECT * FROM referrals WHERE id = ?")
            .bind(referral_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Referral not found".into()))?;

        if referral.status != REFERRAL_PENDING {
            return Err(AppError::Conflict("Referral already converted".into()));
        }

        let rate = sqlx::query_scalar::<_, i32>("SELECT commission_rate FROM affiliate_profiles WHERE id = ?")
            .bind(&referral.affiliate_id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
        let commission = commission_for(payment_amount, rate)?;
        let now = Utc::now();

        let converted = sqlx::query_as::<_, Referral>(
            "UPDATE referrals SET status = ?, payment_amount = ?, commission_amount = ?, commission_status = ?, converted_at = ?
             WHERE id = ? AND status = ?
             RETURNING *"
        )
            .bind(REFERRAL_CONVERTED).bind(payment_amount).bind(commission).bind(COMMISSION_PENDING).bind(now)
            .bind(referral_id).bind(REFERRAL_PENDING)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::Conflict("Referral already converted".into()))?;

        let profile = sqlx::query_as::<_, AffiliateProfile>(
            "UPDATE affiliate_profiles
             SET pending_referrals = pending_referrals - 1,
                 successful_referrals = successful_referrals + 1,
                 pending_commission = pending_commission + ?,
                 total_commission = total_commission + ?,
                 updated_at = ?
             WHERE id = ?
             RETURNING *"
        )
            .bind(commission).bind(commission).bind(now).bind(&referral.affiliate_id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok((converted, profile))
    }

    async fn pay_out(&self, affiliate_id: &str, paid_by: &str) -> Result<(AffiliatePayout, AffiliateProfile), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let pending = sqlx::query_scalar::<_, i64>("SELECT pending_commission FROM affiliate_profiles WHERE id = ?")
            .bind(affiliate_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Affiliate profile not found".into()))?;

        if pending <= 0 {
            return Err(AppError::Conflict("No pending commission to pay out".into()));
        }

        let now = Utc::now();
        let profile = sqlx::query_as::<_, AffiliateProfile>(
            "UPDATE affiliate_profiles
             SET paid_commission = paid_commission + pending_commission,
                 pending_commission = 0,
                 updated_at = ?
             WHERE id = ? AND pending_commission = ?
             RETURNING *"
        )
            .bind(now).bind(affiliate_id).bind(pending)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::Conflict("Pending commission changed, retry the payout".into()))?;

        sqlx::query("UPDATE referrals SET commission_status = ?, paid_at = ? WHERE affiliate_id = ? AND commission_status = ?")
            .bind(COMMISSION_PAID).bind(now).bind(affiliate_id).bind(COMMISSION_PENDING)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        let payout = AffiliatePayout::new(affiliate_id.to_string(), pending, paid_by.to_string());
        let payout = sqlx::query_as::<_, AffiliatePayout>(
            "INSERT INTO affiliate_payouts (id, affiliate_id, amount, paid_by, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&payout.id).bind(&payout.affiliate_id).bind(payout.amount).bind(&payout.paid_by).bind(payout.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok((payout, profile))
    }
}
