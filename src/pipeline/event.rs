//! Inbound receipt notifications.
//!
//! The receipt arrives wrapped in a pub/sub envelope whose `Message` field
//! is itself a JSON string:
//!
//! ```text
//! { "Records": [ { "Sns": { "Message": "{\"receipt\": {...}}" } } ] }
//! ```

use serde::Deserialize;

use crate::error::EventError;

/// Where the raw message was stored and who it was addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Receipt {
    /// Envelope recipients, in the order the receiving server listed them.
    pub recipients: Vec<String>,
    pub action: ReceiptAction,
}

/// Blob-storage locator of the raw message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptAction {
    pub bucket_name: String,
    pub object_key: String,
}

#[derive(Debug, Deserialize)]
struct SnsEvent {
    #[serde(rename = "Records")]
    records: Vec<SnsRecord>,
}

#[derive(Debug, Deserialize)]
struct SnsRecord {
    #[serde(rename = "Sns")]
    sns: SnsMessage,
}

#[derive(Debug, Deserialize)]
struct SnsMessage {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReceiptNotification {
    receipt: Receipt,
}

impl Receipt {
    /// Decode the receipt carried by the first record of an event.
    pub fn from_event(event: &str) -> Result<Self, EventError> {
        let event: SnsEvent = serde_json::from_str(event)?;
        let record = event.records.into_iter().next().ok_or(EventError::NoRecords)?;
        let notification: ReceiptNotification = serde_json::from_str(&record.sns.message)?;
        Ok(notification.receipt)
    }
}
