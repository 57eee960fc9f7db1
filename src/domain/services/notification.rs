use crate::domain::models::{
    affiliate::{AffiliateApplication, AffiliateProfile, ApplicationStatus},
    booking::Booking,
    user::User,
};
use crate::domain::ports::{EmailAttachment, EmailService, OutgoingEmail};
use crate::domain::services::calendar::generate_demo_invite;
use crate::error::AppError;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::{debug, info, warn};

pub const BOOKING_CUSTOMER_TEMPLATE: &str = "booking_customer.html";
pub const BOOKING_TEAM_TEMPLATE: &str = "booking_team.html";
pub const AFFILIATE_DECISION_TEMPLATE: &str = "affiliate_decision.html";

pub struct Notifier {
    email: Option<Arc<dyn EmailService>>,
    templates: Arc<Tera>,
    team_email: String,
    timezone: String,
    site_url: String,
}

impl Notifier {
    pub fn new(
        email: Option<Arc<dyn EmailService>>,
        templates: Arc<Tera>,
        team_email: String,
        timezone: String,
        site_url: String,
    ) -> Self {
        Self { email, templates, team_email, timezone, site_url }
    }

    pub async fn send_booking_confirmation(&self, booking: &Booking, persisted: bool) {
        let Some(email) = &self.email else {
            debug!("Email not configured, skipping booking confirmation");
            return;
        };

        let messages = match self.booking_emails(booking, persisted) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to render booking emails for {}: {}", booking.id, e);
                return;
            }
        };

        for message in &messages {
            match email.send(message).await {
                Ok(()) => info!("Sent '{}' to {:?}", message.subject, message.to),
                Err(e) => warn!("Booking email '{}' failed: {}", message.subject, e),
            }
        }
    }

    pub async fn send_application_decision(&self, user: &User, application: &AffiliateApplication, profile: Option<&AffiliateProfile>) {
        let Some(email) = &self.email else {
            return;
        };

        let message = match self.decision_email(user, application, profile) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to render decision email for {}: {}", application.id, e);
                return;
            }
        };

        if let Err(e) = email.send(&message).await {
            warn!("Affiliate decision email to {} failed: {}", user.email, e);
        }
    }

    fn booking_emails(&self, booking: &Booking, persisted: bool) -> Result<Vec<OutgoingEmail>, AppError> {
        let invite = generate_demo_invite(booking, &self.timezone, &self.site_url);

        let mut context = Context::new();
        context.insert("name", &booking.name);
        context.insert("email", &booking.email);
        context.insert("phone", &booking.phone);
        context.insert("time", &booking.time);
        context.insert("date_long", &booking.date.format("%A, %-d %B %Y").to_string());
        context.insert("timezone", &self.timezone);
        context.insert("booking_id", &booking.id);
        context.insert("site_url", &self.site_url);
        context.insert("persisted", &persisted);
        context.insert("has_invite", &invite.is_some());
        if let Some(firm) = &booking.firm_name {
            context.insert("firm_name", firm);
        }
        if let Some(message) = &booking.message {
            context.insert("message", message);
        }

        let customer_html = self.render(BOOKING_CUSTOMER_TEMPLATE, &context)?;
        let team_html = self.render(BOOKING_TEAM_TEMPLATE, &context)?;

        let attachments = invite
            .map(|ics| vec![EmailAttachment {
                filename: "demo-invite.ics".to_string(),
                content: ics.into_bytes(),
            }])
            .unwrap_or_default();

        let customer = OutgoingEmail {
            to: vec![booking.email.clone()],
            cc: vec![self.team_email.clone()],
            subject: format!("Your demo is confirmed for {} at {}", booking.display_date(), booking.time),
            html_body: customer_html,
            attachments,
        };

        let team = OutgoingEmail {
            to: vec![self.team_email.clone()],
            cc: vec![],
            subject: format!(
                "New demo booking: {} ({})",
                booking.name,
                booking.firm_name.as_deref().unwrap_or("no firm")
            ),
            html_body: team_html,
            attachments: vec![],
        };

        Ok(vec![customer, team])
    }

    fn decision_email(&self, user: &User, application: &AffiliateApplication, profile: Option<&AffiliateProfile>) -> Result<OutgoingEmail, AppError> {
        let approved = application.status() == ApplicationStatus::Approved;

        let mut context = Context::new();
        context.insert("name", &user.name);
        context.insert("company_name", &application.company_name);
        context.insert("approved", &approved);
        if let Some(notes) = &application.admin_notes {
            context.insert("admin_notes", notes);
        }
        if let Some(profile) = profile {
            context.insert("affiliate_code", &profile.affiliate_code);
            context.insert("commission_rate", &profile.commission_rate);
            context.insert(
                "referral_link",
                &format!("{}/register?ref={}", self.site_url.trim_end_matches('/'), profile.affiliate_code),
            );
        }

        let subject = if approved {
            "Your affiliate application is approved"
        } else {
            "Update on your affiliate application"
        };

        Ok(OutgoingEmail {
            to: vec![user.email.clone()],
            cc: vec![],
            subject: subject.to_string(),
            html_body: self.render(AFFILIATE_DECISION_TEMPLATE, &context)?,
            attachments: vec![],
        })
    }

    fn render(&self, template: &str, context: &Context) -> Result<String, AppError> {
        self.templates
            .render(template, context)
            .map_err(|e| AppError::InternalWithMsg(format!("Template {} failed: {}", template, e)))
    }
}

pub fn load_templates() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (BOOKING_CUSTOMER_TEMPLATE, include_str!("../../templates/booking_customer.html")),
        (BOOKING_TEAM_TEMPLATE, include_str!("../../templates/booking_team.html")),
        (AFFILIATE_DECISION_TEMPLATE, include_str!("../../templates/affiliate_decision.html")),
    ])
    .map_err(|e| AppError::InternalWithMsg(format!("Failed to load email templates: {}", e)))?;
    Ok(tera)
}
