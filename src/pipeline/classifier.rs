//! Recipient classifier: splits requested recipients into deliverable
//! and unknown by asking the directory about each one.

use std::time::Duration;

use tracing::{debug, warn};

use crate::directory::{AddressDirectory, Lookup};
use crate::error::DirectoryError;
use crate::pipeline::types::ClassificationResult;

/// Classify `recipients` against `directory`.
///
/// One query per recipient, in input order, each bounded by
/// `query_timeout`. Any failure fails the whole classification: a partial
/// split would silently drop delivery decisions.
pub async fn classify(
    recipients: &[String],
    directory: &dyn AddressDirectory,
    query_timeout: Duration,
) -> Result<ClassificationResult, DirectoryError> {
    let mut lookups = Vec::with_capacity(recipients.len());

    for address in recipients {
        let lookup = tokio::time::timeout(query_timeout, directory.lookup(address))
            .await
            .unwrap_or_else(|_elapsed| {
                Err(DirectoryError::Timeout {
                    address: address.clone(),
                    timeout: query_timeout,
                })
            })
            .inspect_err(|e| warn!(address = %address, error = %e, "Directory lookup failed"))?;

        debug!(address = %address, found = lookup.is_found(), "Recipient looked up");
        lookups.push((address.clone(), lookup));
    }

    Ok(split(lookups))
}

/// Fold completed lookups into a `ClassificationResult`.
pub fn split(lookups: impl IntoIterator<Item = (String, Lookup)>) -> ClassificationResult {
    lookups
        .into_iter()
        .fold(ClassificationResult::default(), |acc, (address, lookup)| {
            acc.record(address, lookup)
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::directory::StaticDirectory;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Directory that records every query and fails on a chosen address.
    struct RecordingDirectory {
        known: HashSet<String>,
        fail_on: Option<String>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AddressDirectory for RecordingDirectory {
        async fn lookup(&self, address: &str) -> Result<Lookup, DirectoryError> {
            self.queries.lock().unwrap().push(address.to_string());
            if self.fail_on.as_deref() == Some(address) {
                return Err(DirectoryError::Query {
                    address: address.to_string(),
                    reason: "server down".into(),
                });
            }
            Ok(if self.known.contains(address) {
                Lookup::Found
            } else {
                Lookup::NotFound
            })
        }

        async fn close(&self) {}
    }

    /// Directory whose lookups never complete.
    struct HangingDirectory;

    #[async_trait]
    impl AddressDirectory for HangingDirectory {
        async fn lookup(&self, _address: &str) -> Result<Lookup, DirectoryError> {
            std::future::pending().await
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn partitions_known_and_unknown() {
        let dir = StaticDirectory::new(["a@x"]);
        let result = classify(&addrs(&["a@x", "c@x"]), &dir, TIMEOUT).await.unwrap();
        assert_eq!(result.deliverable, vec!["a@x"]);
        assert_eq!(result.unknown, vec!["c@x"]);
    }

    #[tokio::test]
    async fn union_is_input_set_and_parts_are_disjoint() {
        let dir = StaticDirectory::new(["a@x", "d@x"]);
        let recipients = addrs(&["a@x", "b@x", "a@x", "c@x", "d@x", "b@x"]);
        let result = classify(&recipients, &dir, TIMEOUT).await.unwrap();

        let deliverable: HashSet<_> = result.deliverable.iter().cloned().collect();
        let unknown: HashSet<_> = result.unknown.iter().cloned().collect();
        let input: HashSet<_> = recipients.iter().cloned().collect();

        assert!(deliverable.is_disjoint(&unknown));
        assert_eq!(&deliverable | &unknown, input);
        assert_eq!(result.deliverable.len() + result.unknown.len(), input.len());
    }

    #[tokio::test]
    async fn one_query_per_recipient_in_order() {
        let dir = RecordingDirectory {
            known: HashSet::from(["a@x".to_string()]),
            fail_on: None,
            queries: Mutex::new(Vec::new()),
        };
        let recipients = addrs(&["b@x", "a@x", "b@x"]);
        classify(&recipients, &dir, TIMEOUT).await.unwrap();
        assert_eq!(*dir.queries.lock().unwrap(), recipients);
    }

    #[tokio::test]
    async fn failure_is_fatal_and_stops_querying() {
        let dir = RecordingDirectory {
            known: HashSet::new(),
            fail_on: Some("b@x".into()),
            queries: Mutex::new(Vec::new()),
        };
        let err = classify(&addrs(&["a@x", "b@x", "c@x"]), &dir, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Query { ref address, .. } if address == "b@x"));
        assert_eq!(*dir.queries.lock().unwrap(), addrs(&["a@x", "b@x"]));
    }

    #[tokio::test]
    async fn slow_lookup_times_out() {
        let err = classify(&addrs(&["a@x"]), &HangingDirectory, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Timeout { .. }));
    }

    #[tokio::test]
    async fn empty_recipient_list() {
        let dir = StaticDirectory::default();
        let result = classify(&[], &dir, TIMEOUT).await.unwrap();
        assert_eq!(result, ClassificationResult::default());
    }

    #[test]
    fn split_folds_lookups() {
        let result = split([
            ("a@x".to_string(), Lookup::Found),
            ("b@x".to_string(), Lookup::NotFound),
        ]);
        assert_eq!(result.deliverable, vec!["a@x"]);
        assert_eq!(result.unknown, vec!["b@x"]);
    }
}
