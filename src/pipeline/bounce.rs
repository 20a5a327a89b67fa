//! Bounce composition: everything the bounce template needs, derived
//! from the unknown recipients, the requested recipients and the original
//! message.
//!
//! All accessors are pure.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::email::NormalizedEmail;

/// The requested recipients grouped by how the sender addressed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientBuckets {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    /// Requested recipients named in neither To nor Cc.
    pub bcc: Vec<String>,
}

/// Fields of the bounce notification template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BounceTemplateData {
    pub unknown_users: String,
    pub original_email_from: String,
    pub original_email_datetime: String,
    pub original_email_recipients_html: String,
    pub original_email_recipients_text: String,
    pub original_email_subject: String,
    pub original_email_contents_html: String,
    pub original_email_contents_text: String,
}

impl BounceTemplateData {
    /// Field name → value, as templated senders take it.
    pub fn into_map(self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("unknown_users".to_string(), self.unknown_users),
            ("original_email_from".to_string(), self.original_email_from),
            ("original_email_datetime".to_string(), self.original_email_datetime),
            (
                "original_email_recipients_html".to_string(),
                self.original_email_recipients_html,
            ),
            (
                "original_email_recipients_text".to_string(),
                self.original_email_recipients_text,
            ),
            ("original_email_subject".to_string(), self.original_email_subject),
            (
                "original_email_contents_html".to_string(),
                self.original_email_contents_html,
            ),
            (
                "original_email_contents_text".to_string(),
                self.original_email_contents_text,
            ),
        ])
    }
}

/// Read-only view over one invocation's bounce inputs.
pub struct BounceComposer<'a> {
    unknown: &'a [String],
    recipients: &'a [String],
    email: &'a NormalizedEmail,
}

impl<'a> BounceComposer<'a> {
    pub fn new(unknown: &'a [String], recipients: &'a [String], email: &'a NormalizedEmail) -> Self {
        Self {
            unknown,
            recipients,
            email,
        }
    }

    /// To and Cc straight from the headers; Bcc is every requested
    /// recipient in neither, compared case-insensitively. Bcc has no
    /// duplicates and keeps the order of the requested recipient list.
    pub fn recipient_buckets(&self) -> RecipientBuckets {
        let header = self.email.header();
        let mut seen: HashSet<String> = header
            .to
            .iter()
            .chain(&header.cc)
            .map(|a| a.to_lowercase())
            .collect();

        let bcc = self
            .recipients
            .iter()
            .filter(|r| seen.insert(r.to_lowercase()))
            .cloned()
            .collect();

        RecipientBuckets {
            to: header.to.clone(),
            cc: header.cc.clone(),
            bcc,
        }
    }

    /// `local(address)` for each unknown recipient, in unknown-set order.
    pub fn unknown_users(&self) -> String {
        self.unknown
            .iter()
            .map(|a| format_unknown_user(a))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn recipients_html(&self) -> String {
        let buckets = self.recipient_buckets();
        format!(
            "To: {}<br>Cc: {}<br>Bcc: {}",
            buckets.to.join(", "),
            buckets.cc.join(", "),
            buckets.bcc.join(", ")
        )
    }

    pub fn recipients_text(&self) -> String {
        let buckets = self.recipient_buckets();
        format!(
            "To: {}\nCc: {}\nBcc: {}",
            buckets.to.join(", "),
            buckets.cc.join(", "),
            buckets.bcc.join(", ")
        )
    }

    /// HTML body, or the text body when the message had no HTML.
    pub fn original_body_html(&self) -> &str {
        match self.email.html_body() {
            "" => self.email.text_body(),
            html => html,
        }
    }

    /// Text body verbatim. An HTML-only message yields "".
    pub fn original_body_text(&self) -> &str {
        self.email.text_body()
    }

    pub fn template_data(&self) -> BounceTemplateData {
        BounceTemplateData {
            unknown_users: self.unknown_users(),
            original_email_from: self.email.sender().to_string(),
            original_email_datetime: self.email.date().to_string(),
            original_email_recipients_html: self.recipients_html(),
            original_email_recipients_text: self.recipients_text(),
            original_email_subject: self.email.subject().to_string(),
            original_email_contents_html: self.original_body_html().to_string(),
            original_email_contents_text: self.original_body_text().to_string(),
        }
    }
}

/// `local(address)`, where local is everything before the first `@`.
/// An address without `@` is its own local part.
pub fn format_unknown_user(address: &str) -> String {
    let local = address.split_once('@').map_or(address, |(local, _)| local);
    format!("{local}({address})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::{ContentType, EmailHeader};

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn email(to: &[&str], cc: &[&str]) -> NormalizedEmail {
        NormalizedEmail::new(EmailHeader {
            from: "sender@example.com".into(),
            to: addrs(to),
            cc: addrs(cc),
            subject: "Status".into(),
            date: "2022-08-21T23:35:23+09:00".into(),
        })
    }

    // ── Buckets ─────────────────────────────────────────────────────

    #[test]
    fn bcc_is_recipients_minus_to() {
        let email = email(&["a@x"], &[]);
        let recipients = addrs(&["a@x", "b@x"]);
        let buckets = BounceComposer::new(&[], &recipients, &email).recipient_buckets();
        assert_eq!(buckets.to, vec!["a@x"]);
        assert!(buckets.cc.is_empty());
        assert_eq!(buckets.bcc, vec!["b@x"]);
    }

    #[test]
    fn bcc_excludes_cc_and_collapses_duplicates() {
        let email = email(&["a@x"], &["c@x"]);
        let recipients = addrs(&["d@x", "c@x", "a@x", "e@x", "d@x"]);
        let buckets = BounceComposer::new(&[], &recipients, &email).recipient_buckets();
        assert_eq!(buckets.bcc, vec!["d@x", "e@x"]);
    }

    #[test]
    fn bcc_comparison_ignores_case() {
        let email = email(&["Alice@Example.com"], &[]);
        let recipients = addrs(&["alice@example.com", "bob@example.com"]);
        let buckets = BounceComposer::new(&[], &recipients, &email).recipient_buckets();
        assert_eq!(buckets.bcc, vec!["bob@example.com"]);
    }

    #[test]
    fn missing_headers_make_everything_bcc() {
        let email = email(&[], &[]);
        let recipients = addrs(&["a@x", "b@x"]);
        let buckets = BounceComposer::new(&[], &recipients, &email).recipient_buckets();
        assert_eq!(buckets.bcc, recipients);
    }

    // ── Unknown users ───────────────────────────────────────────────

    #[test]
    fn unknown_users_single() {
        let unknown = addrs(&["c@x"]);
        let email = email(&[], &[]);
        assert_eq!(
            BounceComposer::new(&unknown, &unknown, &email).unknown_users(),
            "c(c@x)"
        );
    }

    #[test]
    fn unknown_users_keeps_input_order() {
        let unknown = addrs(&["zed@x.com", "amy@y.com"]);
        let email = email(&[], &[]);
        assert_eq!(
            BounceComposer::new(&unknown, &unknown, &email).unknown_users(),
            "zed(zed@x.com), amy(amy@y.com)"
        );
    }

    #[test]
    fn unknown_user_without_at_sign() {
        assert_eq!(format_unknown_user("postmaster"), "postmaster(postmaster)");
    }

    #[test]
    fn unknown_user_splits_on_first_at() {
        assert_eq!(format_unknown_user("a@b@c"), "a(a@b@c)");
    }

    // ── Renditions ──────────────────────────────────────────────────

    #[test]
    fn recipients_renditions() {
        let email = email(&["a@x", "b@x"], &["c@x"]);
        let recipients = addrs(&["a@x", "c@x", "d@x"]);
        let composer = BounceComposer::new(&[], &recipients, &email);
        assert_eq!(
            composer.recipients_html(),
            "To: a@x, b@x<br>Cc: c@x<br>Bcc: d@x"
        );
        assert_eq!(composer.recipients_text(), "To: a@x, b@x\nCc: c@x\nBcc: d@x");
    }

    #[test]
    fn recipients_renditions_with_empty_buckets() {
        let email = email(&["a@x"], &[]);
        let recipients = addrs(&["a@x"]);
        let composer = BounceComposer::new(&[], &recipients, &email);
        assert_eq!(composer.recipients_html(), "To: a@x<br>Cc: <br>Bcc: ");
        assert_eq!(composer.recipients_text(), "To: a@x\nCc: \nBcc: ");
    }

    #[test]
    fn html_body_preferred() {
        let email = email(&[], &[])
            .with_body(ContentType::Text, "plain")
            .with_body(ContentType::Html, "<p>rich</p>");
        let composer = BounceComposer::new(&[], &[], &email);
        assert_eq!(composer.original_body_html(), "<p>rich</p>");
        assert_eq!(composer.original_body_text(), "plain");
    }

    #[test]
    fn html_body_falls_back_to_text() {
        let email = email(&[], &[]).with_body(ContentType::Text, "plain");
        let composer = BounceComposer::new(&[], &[], &email);
        assert_eq!(composer.original_body_html(), "plain");
    }

    #[test]
    fn empty_html_body_falls_back_to_text() {
        let email = email(&[], &[])
            .with_body(ContentType::Html, "")
            .with_body(ContentType::Text, "plain");
        let composer = BounceComposer::new(&[], &[], &email);
        assert_eq!(composer.original_body_html(), "plain");
    }

    #[test]
    fn html_only_message_has_empty_text_rendition() {
        let email = email(&[], &[]).with_body(ContentType::Html, "<p>rich</p>");
        let composer = BounceComposer::new(&[], &[], &email);
        assert_eq!(composer.original_body_text(), "");
        assert_eq!(composer.original_body_html(), "<p>rich</p>");
    }

    // ── Template data ───────────────────────────────────────────────

    #[test]
    fn template_data_has_all_fields() {
        let email = email(&["a@x"], &[]).with_body(ContentType::Text, "hello");
        let recipients = addrs(&["a@x", "c@x"]);
        let unknown = addrs(&["c@x"]);
        let data = BounceComposer::new(&unknown, &recipients, &email).template_data();

        assert_eq!(data.unknown_users, "c(c@x)");
        assert_eq!(data.original_email_from, "sender@example.com");
        assert_eq!(data.original_email_datetime, "2022-08-21T23:35:23+09:00");
        assert_eq!(data.original_email_subject, "Status");
        assert_eq!(data.original_email_contents_html, "hello");
        assert_eq!(data.original_email_contents_text, "hello");
        assert_eq!(data.original_email_recipients_text, "To: a@x\nCc: \nBcc: c@x");

        let map = data.into_map();
        assert_eq!(map.len(), 8);
        assert_eq!(map["original_email_recipients_html"], "To: a@x<br>Cc: <br>Bcc: c@x");
    }

    #[test]
    fn template_data_serializes_with_field_names() {
        let email = email(&[], &[]);
        let unknown = addrs(&["c@x"]);
        let json = serde_json::to_value(
            BounceComposer::new(&unknown, &unknown, &email).template_data(),
        )
        .unwrap();
        assert_eq!(json["unknown_users"], "c(c@x)");
        assert!(json["original_email_contents_text"].is_string());
    }
}
