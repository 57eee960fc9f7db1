use crate::domain::ports::{EmailService, OutgoingEmail};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;
use base64::{Engine as _, engine::general_purpose};

pub struct ResendEmailService {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendEmailService {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[derive(Serialize)]
struct AttachmentPayload {
    filename: String,
    content: String,
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a [String],
    #[serde(skip_serializing_if = "no_recipients")]
    cc: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload>,
}

fn no_recipients(list: &&[String]) -> bool {
    list.is_empty()
}

#[async_trait]
impl EmailService for ResendEmailService {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let attachments = email.attachments.iter()
            .map(|a| AttachmentPayload {
                filename: a.filename.clone(),
                content: general_purpose::STANDARD.encode(&a.content),
            })
            .collect();

        let payload = EmailPayload {
            from: &self.from,
            to: &email.to,
            cc: &email.cc,
            subject: &email.subject,
            html: &email.html_body,
            attachments,
        };

        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Email provider connection error: {}", e);
                error!("{}", msg);
                AppError::Downstream(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Email provider rejected message. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::Downstream(msg));
        }

        Ok(())
    }
}
