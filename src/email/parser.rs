//! `EmailParser`: turns raw RFC 5322 bytes into a `NormalizedEmail`.

use mail_parser::{MessageParser, PartType};

use crate::email::types::{ContentType, EmailHeader, NormalizedEmail};
use crate::error::ParseError;

/// Parses raw message bytes into the normalized record.
pub trait EmailParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<NormalizedEmail, ParseError>;
}

/// `EmailParser` backed by `mail-parser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MailParser;

impl EmailParser for MailParser {
    fn parse(&self, raw: &[u8]) -> Result<NormalizedEmail, ParseError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::Empty);
        }

        let parsed = MessageParser::default()
            .parse(raw)
            .ok_or(ParseError::Malformed)?;

        let header = EmailHeader {
            from: extract_addresses(parsed.from())
                .into_iter()
                .next()
                .unwrap_or_default(),
            to: extract_addresses(parsed.to()),
            cc: extract_addresses(parsed.cc()),
            subject: parsed.subject().unwrap_or_default().to_string(),
            date: parsed.date().map(|d| d.to_rfc3339()).unwrap_or_default(),
        };

        // Only genuine parts count: mail-parser lists a text part under
        // `html_body` when no HTML alternative exists, and vice versa.
        let text = parsed.text_bodies().find_map(|part| match &part.body {
            PartType::Text(text) => Some(text.to_string()),
            _ => None,
        });
        let html = parsed.html_bodies().find_map(|part| match &part.body {
            PartType::Html(html) => Some(html.to_string()),
            _ => None,
        });

        let mut email = NormalizedEmail::new(header).with_raw(raw.to_vec());
        if let Some(text) = text {
            email = email.with_body(ContentType::Text, text);
        }
        if let Some(html) = html {
            email = email.with_body(ContentType::Html, html);
        }
        Ok(email)
    }
}

/// Extract bare email addresses from an optional mail_parser Address field.
///
/// Returns an empty vec if the address is None. Group members are flattened
/// in header order.
pub fn extract_addresses(addr: Option<&mail_parser::Address>) -> Vec<String> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    match addr {
        mail_parser::Address::List(addrs) => addrs
            .iter()
            .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            .collect(),
        mail_parser::Address::Group(groups) => groups
            .iter()
            .flat_map(|g| {
                g.addresses
                    .iter()
                    .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            })
            .collect(),
    }
}
