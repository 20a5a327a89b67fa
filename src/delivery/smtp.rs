//! SMTP relay to the local MTA via lettre. The raw message is relayed
//! unchanged with a per-recipient envelope.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::{Address, SmtpTransport, Transport};
use tracing::info;

use crate::config::DeliveryConfig;
use crate::delivery::LocalDelivery;
use crate::email::NormalizedEmail;
use crate::error::DeliveryError;

pub struct SmtpDelivery {
    transport: SmtpTransport,
}

impl SmtpDelivery {
    pub fn new(config: &DeliveryConfig) -> Self {
        // Plain connection: the relay target is the local MTA.
        let transport = SmtpTransport::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .timeout(Some(config.timeout))
            .build();
        Self { transport }
    }
}

/// Build the SMTP envelope for one recipient. An empty sender becomes the
/// null reverse-path.
pub fn envelope_for(sender: &str, address: &str) -> Result<Envelope, DeliveryError> {
    let invalid = |addr: &str, reason: String| DeliveryError::InvalidAddress {
        address: addr.to_string(),
        reason,
    };

    let from = if sender.is_empty() {
        None
    } else {
        Some(
            sender
                .parse::<Address>()
                .map_err(|e| invalid(sender, e.to_string()))?,
        )
    };
    let to = address
        .parse::<Address>()
        .map_err(|e| invalid(address, e.to_string()))?;

    Envelope::new(from, vec![to]).map_err(|e| invalid(address, e.to_string()))
}

#[async_trait]
impl LocalDelivery for SmtpDelivery {
    async fn deliver(&self, address: &str, email: &NormalizedEmail) -> Result<(), DeliveryError> {
        if email.raw().is_empty() {
            return Err(DeliveryError::EmptyMessage {
                address: address.to_string(),
            });
        }

        let envelope = envelope_for(email.sender(), address)?;
        let raw: Arc<[u8]> = Arc::from(email.raw());
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send_raw(&envelope, &raw))
            .await
            .map_err(|e| DeliveryError::Rejected {
                address: address.to_string(),
                reason: format!("Delivery task panicked: {e}"),
            })?
            .map_err(|e| DeliveryError::Rejected {
                address: address.to_string(),
                reason: format!("SMTP send failed: {e}"),
            })?;

        info!(address, "Delivered to local mailbox");
        Ok(())
    }
}
