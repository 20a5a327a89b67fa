//! Templated notifications: how bounces reach the original sender.

pub mod http;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::NotificationError;

pub use http::HttpTemplateNotifier;

/// A request to render `template` with `template_data` and send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplatedEmail {
    pub template: String,
    pub source: String,
    pub destination: Vec<String>,
    pub template_data: BTreeMap<String, String>,
}

/// Sends templated notifications. Implementations do not retry.
#[async_trait]
pub trait TemplatedNotifier: Send + Sync {
    async fn send(&self, email: &TemplatedEmail) -> Result<(), NotificationError>;
}
