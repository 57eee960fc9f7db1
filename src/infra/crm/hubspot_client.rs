use crate::domain::ports::{CrmClient, CrmContact};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, error};

pub struct HubspotClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl HubspotClient {
    pub fn new(base_url: String, access_token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn properties(contact: &CrmContact) -> Value {
        let (first, last) = split_name(&contact.name);
        let mut props = Map::new();
        props.insert("email".into(), json!(contact.email));
        props.insert("firstname".into(), json!(first));
        if !last.is_empty() {
            props.insert("lastname".into(), json!(last));
        }
        if let Some(phone) = &contact.phone {
            props.insert("phone".into(), json!(phone));
        }
        if let Some(company) = &contact.company {
            props.insert("company".into(), json!(company));
        }
        props.insert("lifecyclestage".into(), json!(contact.lifecycle_stage));
        props.insert("hs_lead_status".into(), json!("NEW"));
        props.insert("lead_source".into(), json!(contact.source));
        json!({ "properties": props })
    }
}

fn split_name(name: &str) -> (String, String) {
    let mut parts = name.trim().splitn(2, ' ');
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.next().unwrap_or_default().trim().to_string();
    (first, last)
}

#[async_trait]
impl CrmClient for HubspotClient {
    async fn upsert_contact(&self, contact: &CrmContact) -> Result<(), AppError> {
        let body = Self::properties(contact);

        let res = self.client.post(format!("{}/crm/v3/objects/contacts", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Downstream(format!("CRM connection error: {}", e)))?;

        if res.status() == StatusCode::CONFLICT {
            debug!("CRM contact exists, updating by email");
            let res = self.client.patch(format!("{}/crm/v3/objects/contacts/{}?idProperty=email", self.base_url, contact.email))
                .bearer_auth(&self.access_token)
                .json(&body)
                .send()
                .await
                .map_err(|e| AppError::Downstream(format!("CRM connection error: {}", e)))?;

            if !res.status().is_success() {
                let status = res.status();
                let text = res.text().await.unwrap_or_default();
                error!("CRM update failed. Status: {}, Body: {}", status, text);
                return Err(AppError::Downstream(format!("CRM update failed with {}", status)));
            }
            return Ok(());
        }

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            error!("CRM create failed. Status: {}, Body: {}", status, text);
            return Err(AppError::Downstream(format!("CRM create failed with {}", status)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_properties() {
        let contact = CrmContact {
            email: "asha@x.com".into(),
            name: "Asha  Rao Iyer".into(),
            phone: Some("9999999999".into()),
            company: None,
            lifecycle_stage: "lead".into(),
            source: "demo_booking".into(),
        };

        let body = HubspotClient::properties(&contact);
        assert_eq!(body["properties"]["firstname"], "Asha");
        assert_eq!(body["properties"]["lastname"], "Rao Iyer");
        assert_eq!(body["properties"]["phone"], "9999999999");
        assert!(body["properties"].get("company").is_none());
        assert_eq!(body["properties"]["lead_source"], "demo_booking");
    }
}
