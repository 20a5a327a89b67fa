//! Local delivery: hands accepted messages to the local MTA.

pub mod smtp;

use async_trait::async_trait;

use crate::email::NormalizedEmail;
use crate::error::DeliveryError;

pub use smtp::SmtpDelivery;

/// Submits one message for one local recipient.
#[async_trait]
pub trait LocalDelivery: Send + Sync {
    async fn deliver(&self, address: &str, email: &NormalizedEmail) -> Result<(), DeliveryError>;
}
