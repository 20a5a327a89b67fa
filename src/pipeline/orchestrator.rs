//! Delivery orchestrator: owns one invocation from classification to the
//! bounce notification.
//!
//! Flow:
//! 1. Classify recipients (fatal on directory failure)
//! 2. Deliver to every deliverable recipient (failures recorded, not fatal)
//! 3. Compose and send at most one bounce for the unknown recipients
//! 4. Close the directory, on every path

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::BounceConfig;
use crate::delivery::LocalDelivery;
use crate::directory::AddressDirectory;
use crate::email::NormalizedEmail;
use crate::error::{DeliveryError, Error};
use crate::notify::{TemplatedEmail, TemplatedNotifier};
use crate::pipeline::bounce::BounceComposer;
use crate::pipeline::classifier::classify;
use crate::pipeline::types::{
    BounceOutcome, ClassificationResult, DeliveryReport, InvocationState, RecipientFailure,
};

/// Default bound on a single directory lookup.
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on a single local delivery.
const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DeliveryOrchestrator {
    delivery: Arc<dyn LocalDelivery>,
    notifier: Arc<dyn TemplatedNotifier>,
    bounce: BounceConfig,
    query_timeout: Duration,
    delivery_timeout: Duration,
}

impl DeliveryOrchestrator {
    pub fn new(
        delivery: Arc<dyn LocalDelivery>,
        notifier: Arc<dyn TemplatedNotifier>,
        bounce: BounceConfig,
    ) -> Self {
        Self {
            delivery,
            notifier,
            bounce,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, query: Duration, delivery: Duration) -> Self {
        self.query_timeout = query;
        self.delivery_timeout = delivery;
        self
    }

    /// Process one inbound message for `recipients`.
    ///
    /// Takes ownership of the directory connection and closes it exactly
    /// once before returning, whatever the outcome.
    pub async fn process(
        &self,
        recipients: &[String],
        email: &NormalizedEmail,
        directory: Box<dyn AddressDirectory>,
    ) -> Result<DeliveryReport, Error> {
        let outcome = self.run(recipients, email, directory.as_ref()).await;

        transition(InvocationState::Closed);
        directory.close().await;

        outcome
    }

    async fn run(
        &self,
        recipients: &[String],
        email: &NormalizedEmail,
        directory: &dyn AddressDirectory,
    ) -> Result<DeliveryReport, Error> {
        info!(
            sender = %email.sender(),
            recipients = recipients.len(),
            "Processing inbound message"
        );

        transition(InvocationState::Classifying);
        let ClassificationResult {
            deliverable,
            unknown,
        } = classify(recipients, directory, self.query_timeout)
            .await
            .inspect_err(|e| {
                error!(
                    error = %e,
                    recipients = ?recipients,
                    "Recipient classification failed; aborting invocation"
                );
            })?;

        transition(InvocationState::Delivering);
        let mut delivered = Vec::with_capacity(deliverable.len());
        let mut failures = Vec::new();
        for address in deliverable {
            match self.deliver_one(&address, email).await {
                Ok(()) => delivered.push(address),
                Err(e) => {
                    warn!(address = %address, error = %e, "Local delivery failed");
                    failures.push(RecipientFailure {
                        address,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let bounce = if unknown.is_empty() {
            BounceOutcome::NotNeeded
        } else {
            self.bounce(&unknown, recipients, email).await
        };

        let report = DeliveryReport {
            delivered,
            unknown,
            failures,
            bounce,
            finished_at: Utc::now(),
        };

        info!(
            delivered = report.delivered.len(),
            unknown = report.unknown.len(),
            failed = report.failures.len(),
            bounce = report.bounce.label(),
            "Inbound message processed"
        );
        Ok(report)
    }

    async fn deliver_one(&self, address: &str, email: &NormalizedEmail) -> Result<(), DeliveryError> {
        tokio::time::timeout(self.delivery_timeout, self.delivery.deliver(address, email))
            .await
            .unwrap_or_else(|_elapsed| {
                Err(DeliveryError::Timeout {
                    address: address.to_string(),
                    timeout: self.delivery_timeout,
                })
            })
    }

    /// Compose and submit the single bounce for this invocation.
    async fn bounce(
        &self,
        unknown: &[String],
        recipients: &[String],
        email: &NormalizedEmail,
    ) -> BounceOutcome {
        // Null sender: bouncing would only create a loop.
        if email.sender().is_empty() {
            warn!(unknown = ?unknown, "Unknown recipients but no sender; bounce suppressed");
            return BounceOutcome::Suppressed;
        }

        transition(InvocationState::ComposingBounce);
        let data = BounceComposer::new(unknown, recipients, email).template_data();
        let request = TemplatedEmail {
            template: self.bounce.template.clone(),
            source: self.bounce.source_address.clone(),
            destination: vec![email.sender().to_string()],
            template_data: data.into_map(),
        };

        transition(InvocationState::Notifying);
        match self.notifier.send(&request).await {
            Ok(()) => {
                info!(
                    to = %email.sender(),
                    unknown = ?unknown,
                    "Bounce notification sent"
                );
                BounceOutcome::Sent
            }
            Err(e) => {
                error!(to = %email.sender(), error = %e, "Bounce notification failed");
                BounceOutcome::Failed(e.to_string())
            }
        }
    }
}

fn transition(state: InvocationState) {
    debug!(state = %state, "Invocation state");
}
