//! HTTP notifier posting a SendTemplatedEmail-shaped JSON request.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::info;

use crate::config::NotifierConfig;
use crate::error::NotificationError;
use crate::notify::{TemplatedEmail, TemplatedNotifier};

pub struct HttpTemplateNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendTemplatedEmailRequest<'a> {
    source: &'a str,
    destination: Destination<'a>,
    template: &'a str,
    /// JSON-encoded object, as template services expect.
    template_data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Destination<'a> {
    to_addresses: &'a [String],
}

impl HttpTemplateNotifier {
    pub fn new(config: &NotifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

/// Serialize a templated email into the wire request body.
fn request_body(email: &TemplatedEmail) -> Result<serde_json::Value, NotificationError> {
    let request = SendTemplatedEmailRequest {
        source: &email.source,
        destination: Destination {
            to_addresses: &email.destination,
        },
        template: &email.template,
        template_data: serde_json::to_string(&email.template_data)?,
    };
    Ok(serde_json::to_value(request)?)
}

#[async_trait]
impl TemplatedNotifier for HttpTemplateNotifier {
    async fn send(&self, email: &TemplatedEmail) -> Result<(), NotificationError> {
        let body = request_body(email)?;

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotificationError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            template = %email.template,
            destination = ?email.destination,
            "Templated notification sent"
        );
        Ok(())
    }
}
