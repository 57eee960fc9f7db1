use crate::domain::models::affiliate::{AffiliatePayout, AffiliateProfile, Referral, MAX_PAYMENT_AMOUNT};
use crate::domain::ports::AffiliateRepository;
use crate::domain::services::validation::{self, MAX_SHORT_TEXT};
use crate::error::AppError;
use std::sync::Arc;
use tracing::{error, info};

/// Commission accrual and payout. Amounts are in paise.
pub struct CommissionLedger {
    affiliates: Arc<dyn AffiliateRepository>,
}

impl CommissionLedger {
    pub fn new(affiliates: Arc<dyn AffiliateRepository>) -> Self {
        Self { affiliates }
    }

    pub async fn record_conversion(&self, referral_id: &str, payment_amount: i64) -> Result<(Referral, AffiliateProfile), AppError> {
        if payment_amount <= 0 {
            return Err(AppError::Validation("Payment amount must be positive".into()));
        }
        if payment_amount > MAX_PAYMENT_AMOUNT {
            return Err(AppError::Validation(format!("Payment amount cannot exceed {} paise", MAX_PAYMENT_AMOUNT)));
        }

        let (referral, profile) = self.affiliates.convert_referral(referral_id, payment_amount).await?;
        Self::check_balances(&profile);

        info!(
            "Referral {} converted: payment {} commission {} for affiliate {}",
            referral.id,
            payment_amount,
            referral.commission_amount.unwrap_or_default(),
            profile.affiliate_code
        );
        Ok((referral, profile))
    }

    pub async fn pay_out(&self, affiliate_id: &str, paid_by: Option<&str>) -> Result<(AffiliatePayout, AffiliateProfile), AppError> {
        let paid_by = validation::required("Paid by", paid_by, MAX_SHORT_TEXT)?;

        let (payout, profile) = self.affiliates.pay_out(affiliate_id, &paid_by).await?;
        Self::check_balances(&profile);

        info!("Paid {} to affiliate {} ({})", payout.amount, profile.affiliate_code, payout.id);
        Ok((payout, profile))
    }

    fn check_balances(profile: &AffiliateProfile) {
        if !profile.counters_consistent() {
            error!(
                affiliate = %profile.id,
                total_referrals = profile.total_referrals,
                successful_referrals = profile.successful_referrals,
                pending_referrals = profile.pending_referrals,
                total_commission = profile.total_commission,
                pending_commission = profile.pending_commission,
                paid_commission = profile.paid_commission,
                "Affiliate counters out of step"
            );
        }
    }
}
