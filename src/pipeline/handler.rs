//! Invocation handler: one receipt event in, one status out.
//!
//! event → receipt → blob → parse → directory → orchestrator → status

use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::directory::DirectoryConnector;
use crate::email::EmailParser;
use crate::error::Error;
use crate::pipeline::event::{Receipt, ReceiptAction};
use crate::pipeline::orchestrator::DeliveryOrchestrator;
use crate::pipeline::types::DeliveryReport;
use crate::storage::BlobStore;

/// Structured result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationStatus {
    pub status_code: u16,
    /// JSON-encoded body.
    pub body: String,
}

impl InvocationStatus {
    pub fn ok() -> Self {
        Self::new(200, serde_json::json!({ "result": "OK" }))
    }

    /// Processed, but some deliveries or the bounce failed.
    pub fn partial(report: &DeliveryReport) -> Self {
        Self::new(
            207,
            serde_json::json!({
                "result": "PARTIAL",
                "delivered": report.delivered,
                "unknown": report.unknown,
                "failures": report.failures,
                "bounce": report.bounce,
            }),
        )
    }

    pub fn failed(err: &Error) -> Self {
        let status_code = if err.is_bad_input() { 400 } else { 500 };
        Self::new(
            status_code,
            serde_json::json!({ "result": "ERROR", "error": err.to_string() }),
        )
    }

    fn new(status_code: u16, body: serde_json::Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

pub struct InvocationHandler {
    blobs: Arc<dyn BlobStore>,
    parser: Arc<dyn EmailParser>,
    directory: Arc<dyn DirectoryConnector>,
    orchestrator: DeliveryOrchestrator,
}

impl InvocationHandler {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        parser: Arc<dyn EmailParser>,
        directory: Arc<dyn DirectoryConnector>,
        orchestrator: DeliveryOrchestrator,
    ) -> Self {
        Self {
            blobs,
            parser,
            directory,
            orchestrator,
        }
    }

    /// Handle one receipt event. Never panics on bad input; every failure
    /// is logged and mapped to a status.
    pub async fn handle(&self, event: &str) -> InvocationStatus {
        let span = info_span!("invocation", id = %Uuid::new_v4());
        async {
            match self.run(event).await {
                Ok(report) if report.is_complete() => InvocationStatus::ok(),
                Ok(report) => InvocationStatus::partial(&report),
                Err(e) => {
                    error!(error = %e, "Invocation failed");
                    InvocationStatus::failed(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run one invocation to a report.
    pub async fn run(&self, event: &str) -> Result<DeliveryReport, Error> {
        let receipt = Receipt::from_event(event)?;
        let ReceiptAction {
            bucket_name,
            object_key,
        } = &receipt.action;

        info!(
            store = self.blobs.name(),
            container = %bucket_name,
            key = %object_key,
            recipients = receipt.recipients.len(),
            "Receipt decoded"
        );

        // The temporary copy lives until this function returns.
        let blob = self.blobs.fetch(bucket_name, object_key).await?;
        let raw = blob.read().await?;
        let email = self.parser.parse(&raw)?;

        let directory = self.directory.connect().await?;
        self.orchestrator
            .process(&receipt.recipients, &email, directory)
            .await
    }
}
