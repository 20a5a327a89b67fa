//! Email-specific types: the normalized record downstream logic works on.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Body content types the relay keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "text/plain")]
    Text,
    #[serde(rename = "text/html")]
    Html,
}

impl ContentType {
    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Html => "text/html",
        }
    }
}

/// Headers of the original message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailHeader {
    /// Sender address (bare `local@domain`), empty for a null sender.
    pub from: String,
    /// To recipients, in header order.
    #[serde(default)]
    pub to: Vec<String>,
    /// Cc recipients, in header order.
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub subject: String,
    /// RFC 3339 date, or the empty string when the message carried none.
    #[serde(default)]
    pub date: String,
}

/// The parsed, structure-independent representation of an email.
///
/// Holds at most one body per content type. Built once by a parser and
/// never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct NormalizedEmail {
    header: EmailHeader,
    body: HashMap<ContentType, String>,
    raw: Arc<[u8]>,
}

impl NormalizedEmail {
    pub fn new(header: EmailHeader) -> Self {
        Self {
            header,
            body: HashMap::new(),
            raw: Arc::from(Vec::new()),
        }
    }

    /// Set the body for a content type. The first value for each type wins.
    pub fn with_body(mut self, content_type: ContentType, content: impl Into<String>) -> Self {
        self.body.entry(content_type).or_insert_with(|| content.into());
        self
    }

    /// Attach the raw RFC 5322 bytes the record was parsed from.
    pub fn with_raw(mut self, raw: impl Into<Arc<[u8]>>) -> Self {
        self.raw = raw.into();
        self
    }

    pub fn header(&self) -> &EmailHeader {
        &self.header
    }

    pub fn sender(&self) -> &str {
        &self.header.from
    }

    pub fn subject(&self) -> &str {
        &self.header.subject
    }

    pub fn date(&self) -> &str {
        &self.header.date
    }

    /// Body for a content type, empty when the message had none.
    pub fn body(&self, content_type: ContentType) -> &str {
        self.body.get(&content_type).map_or("", String::as_str)
    }

    pub fn text_body(&self) -> &str {
        self.body(ContentType::Text)
    }

    pub fn html_body(&self) -> &str {
        self.body(ContentType::Html)
    }

    /// Raw message bytes, empty when the record was built by hand.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}
