use crate::domain::models::affiliate::{
    AffiliateApplication, AffiliateProfile, ApplicationFields, ApplicationStatus, Decision, ProfileStatus, Referral,
    DASHBOARD_REFERRAL_CAP, REFERRAL_SOURCE_DASHBOARD, REFERRAL_SOURCE_SIGNUP,
};
use crate::domain::models::user::{User, ROLE_USER, SELF_SERVICE_ROLES};
use crate::domain::ports::{AffiliateRepository, CrmContact, Submission, UserRepository};
use crate::domain::services::crm_dispatch::CrmDispatcher;
use crate::domain::services::notification::Notifier;
use crate::domain::services::validation::{self, MAX_LONG_TEXT, MAX_SHORT_TEXT};
use crate::error::AppError;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MIN_REASON_CHARS: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct ApplicationInput {
    pub company_name: Option<String>,
    pub website_url: Option<String>,
    pub promotion_method: Option<String>,
    pub expected_referrals: Option<String>,
    pub reason: Option<String>,
    pub payment_email: Option<String>,
}

impl ApplicationInput {
    pub fn validate(self) -> Result<ApplicationFields, AppError> {
        let company_name = validation::required("Company name", self.company_name.as_deref(), MAX_SHORT_TEXT)?;
        let website = validation::required("Website URL", self.website_url.as_deref(), MAX_SHORT_TEXT)?;
        let promotion_method = validation::required("Promotion method", self.promotion_method.as_deref(), MAX_LONG_TEXT)?;
        let reason = validation::required("Reason", self.reason.as_deref(), MAX_LONG_TEXT)?;
        validation::min_chars("Reason", &reason, MIN_REASON_CHARS)?;

        let payment_email = match validation::optional(self.payment_email.as_deref(), MAX_SHORT_TEXT) {
            Some(e) => Some(validation::email("Payment email", &e)?),
            None => None,
        };

        Ok(ApplicationFields {
            company_name,
            website_url: Some(validation::url("Website URL", &website)?),
            promotion_method,
            expected_referrals: validation::optional(self.expected_referrals.as_deref(), 32),
            reason: Some(reason),
            payment_email,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuickApplicationInput {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub account_email: Option<String>,
    pub payment_email: Option<String>,
    pub promotion_method: Option<String>,
    pub website_url: Option<String>,
}

impl QuickApplicationInput {
    pub fn validate(self) -> Result<(String, String, ApplicationFields), AppError> {
        let user_id = validation::required("User id", self.user_id.as_deref(), MAX_SHORT_TEXT)?;
        let name = validation::required("Name", self.name.as_deref(), MAX_SHORT_TEXT)?;
        let account_email = validation::required("Account email", self.account_email.as_deref(), MAX_SHORT_TEXT)?;
        let payment_email = validation::required("Payment email", self.payment_email.as_deref(), MAX_SHORT_TEXT)?;
        let promotion_method = validation::required("Promotion method", self.promotion_method.as_deref(), MAX_LONG_TEXT)?;

        let website_url = match validation::optional(self.website_url.as_deref(), MAX_SHORT_TEXT) {
            Some(url) => Some(validation::url("Website URL", &url)?),
            None => None,
        };

        let fields = ApplicationFields {
            company_name: name,
            website_url,
            promotion_method,
            expected_referrals: None,
            reason: None,
            payment_email: Some(validation::email("Payment email", &payment_email)?),
        };
        Ok((user_id, validation::email("Account email", &account_email)?, fields))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub already_pending: bool,
    pub application: AffiliateApplication,
    pub profile: Option<AffiliateProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStatus {
    pub can_refer: bool,
    pub referral_count: i32,
    pub referral_limit: i32,
    pub affiliate_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub referral_code: Option<String>,
}

pub struct AffiliateLedger {
    affiliates: Arc<dyn AffiliateRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<Notifier>,
    crm: CrmDispatcher,
    default_commission_rate: i32,
}

impl AffiliateLedger {
    pub fn new(
        affiliates: Arc<dyn AffiliateRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<Notifier>,
        crm: CrmDispatcher,
        default_commission_rate: i32,
    ) -> Self {
        Self { affiliates, users, notifier, crm, default_commission_rate }
    }

    pub async fn submit_application(&self, user: &User, input: ApplicationInput) -> Result<SubmissionOutcome, AppError> {
        let fields = input.validate()?;
        self.submit(user, fields).await
    }

    pub async fn submit_quick_application(&self, input: QuickApplicationInput) -> Result<SubmissionOutcome, AppError> {
        let (user_id, account_email, fields) = input.validate()?;

        let user = self.users.find_by_id(&user_id).await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if !user.email.eq_ignore_ascii_case(&account_email) {
            return Err(AppError::Validation("Account email does not match this user".into()));
        }

        self.submit(&user, fields).await
    }

    async fn submit(&self, user: &User, fields: ApplicationFields) -> Result<SubmissionOutcome, AppError> {
        if let Some(latest) = self.affiliates.latest_application(&user.id).await? {
            if latest.status() == ApplicationStatus::Approved {
                return Err(AppError::Conflict("User is already an approved affiliate".into()));
            }
        }

        let application = AffiliateApplication::new(user.id.clone(), &fields);
        let profile = AffiliateProfile::new(user.id.clone(), &fields, self.default_commission_rate);

        let outcome = match self.affiliates.submit_application(&application, &profile).await {
            Ok(Submission::Created { application, profile }) => {
                info!("Affiliate application {} submitted by {}", application.id, user.id);
                self.crm.sync_contact(CrmContact {
                    email: user.email.clone(),
                    name: user.name.clone(),
                    phone: user.phone.clone(),
                    company: Some(application.company_name.clone()),
                    lifecycle_stage: "other".into(),
                    source: "affiliate_application".into(),
                });
                SubmissionOutcome { already_pending: false, application, profile: Some(profile) }
            }
            Ok(Submission::AlreadyPending(existing)) => self.already_pending(existing).await?,
            // Two concurrent submissions: the partial unique index lets one through.
            Err(e) if e.is_unique_violation() => {
                let existing = self.affiliates.latest_application(&user.id).await?
                    .ok_or_else(|| AppError::InternalWithMsg("Pending application vanished".into()))?;
                self.already_pending(existing).await?
            }
            Err(e) => return Err(e),
        };

        Ok(outcome)
    }

    async fn already_pending(&self, existing: AffiliateApplication) -> Result<SubmissionOutcome, AppError> {
        debug!("User {} already has pending application {}", existing.user_id, existing.id);
        let profile = self.affiliates.find_profile_by_user(&existing.user_id).await?;
        Ok(SubmissionOutcome { already_pending: true, application: existing, profile })
    }

    pub async fn decide_application(
        &self,
        application_id: &str,
        decision: &str,
        notes: Option<&str>,
        decided_by: &str,
    ) -> Result<AffiliateApplication, AppError> {
        let decision = Decision::from_str(decision).map_err(AppError::Validation)?;
        let notes = validation::optional(notes, MAX_LONG_TEXT);

        let decided = self.affiliates
            .decide_application(application_id, decision, notes.as_deref(), decided_by)
            .await?;
        info!("Application {} {} by {}", decided.id, decided.status, decided_by);

        match self.users.find_by_id(&decided.user_id).await {
            Ok(Some(user)) => {
                let profile = match decision {
                    Decision::Approve => self.affiliates.find_profile_by_user(&user.id).await.ok().flatten(),
                    Decision::Reject => None,
                };
                self.notifier.send_application_decision(&user, &decided, profile.as_ref()).await;
            }
            Ok(None) => warn!("Applicant {} no longer exists, skipping decision email", decided.user_id),
            Err(e) => warn!("Could not load applicant {} for decision email: {}", decided.user_id, e),
        }

        Ok(decided)
    }

    pub async fn update_profile_status(&self, profile_id: &str, status: &str) -> Result<AffiliateProfile, AppError> {
        let next = ProfileStatus::from_str(status).map_err(AppError::Validation)?;
        let profile = self.affiliates.find_profile(profile_id).await?
            .ok_or_else(|| AppError::NotFound("Affiliate profile not found".into()))?;

        let current = profile.status();
        if current == next {
            return Ok(profile);
        }
        if !current.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Cannot move affiliate from {} to {}", current.as_str(), next.as_str()
            )));
        }

        let updated = self.affiliates.update_profile_status(profile_id, next).await?;
        info!("Affiliate profile {} moved {} -> {}", updated.id, current.as_str(), next.as_str());
        Ok(updated)
    }

    pub async fn profile_for(&self, user: &User) -> Result<(Option<AffiliateProfile>, Option<AffiliateApplication>), AppError> {
        let profile = self.affiliates.find_profile_by_user(&user.id).await?;
        let application = self.affiliates.latest_application(&user.id).await?;
        Ok((profile, application))
    }

    pub async fn can_refer(&self, affiliate_id: &str) -> Result<bool, AppError> {
        let profile = self.affiliates.find_profile(affiliate_id).await?
            .ok_or_else(|| AppError::NotFound("Affiliate profile not found".into()))?;
        Ok(profile.can_refer())
    }

    pub async fn referral_status(&self, user: &User) -> Result<ReferralStatus, AppError> {
        let profile = self.affiliates.find_profile_by_user(&user.id).await?;
        Ok(match profile {
            Some(p) => ReferralStatus {
                can_refer: p.can_refer(),
                referral_count: p.dashboard_referral_count,
                referral_limit: DASHBOARD_REFERRAL_CAP,
                affiliate_code: Some(p.affiliate_code),
            },
            None => ReferralStatus {
                can_refer: false,
                referral_count: 0,
                referral_limit: DASHBOARD_REFERRAL_CAP,
                affiliate_code: None,
            },
        })
    }

    pub async fn refer_contact(&self, user: &User, name: Option<&str>, email: Option<&str>) -> Result<Referral, AppError> {
        let name = validation::required("Name", name, MAX_SHORT_TEXT)?;
        let email = validation::required("Email", email, MAX_SHORT_TEXT)?;
        let email = validation::email("Email", &email)?;

        let profile = self.affiliates.find_profile_by_user(&user.id).await?
            .ok_or_else(|| AppError::Forbidden("Not an affiliate".into()))?;
        if profile.status() != ProfileStatus::Approved {
            return Err(AppError::Forbidden("Affiliate account is not active".into()));
        }
        if !profile.can_refer() {
            return Err(AppError::Conflict("Referral limit reached".into()));
        }

        let referral = Referral::new(profile.id.clone(), None, name.clone(), email.clone(), REFERRAL_SOURCE_DASHBOARD);
        let created = self.affiliates.record_dashboard_referral(&referral).await?;
        info!("Affiliate {} referred a contact ({})", profile.affiliate_code, created.id);

        self.crm.sync_contact(CrmContact {
            email,
            name,
            lifecycle_stage: "lead".into(),
            source: format!("affiliate:{}", profile.affiliate_code),
            ..Default::default()
        });

        Ok(created)
    }

    pub async fn list_referrals(&self, affiliate_id: &str) -> Result<Vec<Referral>, AppError> {
        self.affiliates.find_profile(affiliate_id).await?
            .ok_or_else(|| AppError::NotFound("Affiliate profile not found".into()))?;
        self.affiliates.list_referrals(affiliate_id).await
    }

    pub async fn list_applications(&self, status: Option<&str>) -> Result<Vec<AffiliateApplication>, AppError> {
        let status = match validation::optional(status, 16) {
            Some(s) => Some(ApplicationStatus::from_str(&s).map_err(AppError::Validation)?),
            None => None,
        };
        self.affiliates.list_applications(status.as_ref().map(ApplicationStatus::as_str)).await
    }

    pub async fn list_profiles(&self) -> Result<Vec<AffiliateProfile>, AppError> {
        self.affiliates.list_profiles().await
    }

    pub async fn register_user(&self, input: RegistrationInput) -> Result<User, AppError> {
        let name = validation::required("Name", input.name.as_deref(), MAX_SHORT_TEXT)?;
        let email = validation::required("Email", input.email.as_deref(), MAX_SHORT_TEXT)?;
        let email = validation::email("Email", &email)?;
        let phone = match validation::optional(input.phone.as_deref(), MAX_SHORT_TEXT) {
            Some(p) => Some(validation::phone(&p)?),
            None => None,
        };
        let role = validation::optional(input.role.as_deref(), 32).unwrap_or_else(|| ROLE_USER.to_string());
        if !SELF_SERVICE_ROLES.contains(&role.as_str()) {
            return Err(AppError::Validation(format!("Role {} cannot be self-assigned", role)));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("An account with this email already exists".into()));
        }

        let mut user = User::new(name, email, phone, role);

        let referrer = match validation::optional(input.referral_code.as_deref(), 32) {
            Some(code) => match self.affiliates.find_profile_by_code(&code.to_uppercase()).await? {
                Some(p) if p.status() == ProfileStatus::Approved => Some(p),
                _ => {
                    debug!("Ignoring referral code {}", code);
                    None
                }
            },
            None => None,
        };

        let referral = referrer.as_ref().map(|p| {
            user.referred_by = Some(p.id.clone());
            Referral::new(p.id.clone(), Some(user.id.clone()), user.name.clone(), user.email.clone(), REFERRAL_SOURCE_SIGNUP)
        });

        let created = self.users.create_with_referral(&user, referral.as_ref()).await?;
        match &referrer {
            Some(p) => info!("User {} registered via affiliate {}", created.id, p.affiliate_code),
            None => info!("User {} registered", created.id),
        }

        self.crm.sync_contact(CrmContact {
            email: created.email.clone(),
            name: created.name.clone(),
            phone: created.phone.clone(),
            lifecycle_stage: "subscriber".into(),
            source: referrer
                .map(|p| format!("affiliate:{}", p.affiliate_code))
                .unwrap_or_else(|| "registration".into()),
            ..Default::default()
        });

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> ApplicationInput {
        ApplicationInput {
            company_name: Some("Rao & Co".into()),
            website_url: Some("raoandco.in".into()),
            promotion_method: Some("Newsletter to 4,000 CA students".into()),
            expected_referrals: Some("11-25".into()),
            reason: Some("We run a weekly newsletter for practising CAs and want to recommend tools.".into()),
            payment_email: None,
        }
    }

    #[test]
    fn test_canonical_form_normalizes() {
        let fields = canonical().validate().unwrap();
        assert_eq!(fields.website_url.as_deref(), Some("https://raoandco.in"));
        assert_eq!(fields.expected_referrals.as_deref(), Some("11-25"));
        assert!(fields.payment_email.is_none());
    }

    #[test]
    fn test_short_reason_rejected() {
        let mut input = canonical();
        input.reason = Some("I like it".into());
        assert!(matches!(input.validate(), Err(AppError::Validation(msg)) if msg.contains("50")));
    }

    #[test]
    fn test_canonical_requires_website() {
        let mut input = canonical();
        input.website_url = None;
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_quick_form_uses_name_as_company() {
        let (user_id, account_email, fields) = QuickApplicationInput {
            user_id: Some("u-1".into()),
            name: Some("Asha Rao".into()),
            account_email: Some("Asha@X.com".into()),
            payment_email: Some("pay@x.com".into()),
            promotion_method: Some("YouTube".into()),
            website_url: None,
        }
        .validate()
        .unwrap();

        assert_eq!(user_id, "u-1");
        assert_eq!(account_email, "asha@x.com");
        assert_eq!(fields.company_name, "Asha Rao");
        assert!(fields.website_url.is_none());
        assert_eq!(fields.payment_email.as_deref(), Some("pay@x.com"));
    }

    #[test]
    fn test_quick_form_requires_payment_email() {
        let input = QuickApplicationInput {
            user_id: Some("u-1".into()),
            name: Some("Asha Rao".into()),
            account_email: Some("asha@x.com".into()),
            payment_email: None,
            promotion_method: Some("YouTube".into()),
            website_url: None,
        };
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));
    }
}
