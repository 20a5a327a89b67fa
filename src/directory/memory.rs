//! Static in-memory directory, matched case-insensitively.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::directory::{AddressDirectory, DirectoryConnector, Lookup};
use crate::error::DirectoryError;

/// Fixed set of known mailboxes.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    mailboxes: HashSet<String>,
}

impl StaticDirectory {
    pub fn new<I, S>(mailboxes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mailboxes: mailboxes
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Parse a comma-separated mailbox list.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }
}

#[async_trait]
impl AddressDirectory for StaticDirectory {
    async fn lookup(&self, address: &str) -> Result<Lookup, DirectoryError> {
        Ok(if self.mailboxes.contains(&address.trim().to_lowercase()) {
            Lookup::Found
        } else {
            Lookup::NotFound
        })
    }

    async fn close(&self) {}
}

/// Hands out clones of one shared `StaticDirectory`.
#[derive(Debug, Clone)]
pub struct StaticConnector {
    directory: Arc<StaticDirectory>,
}

impl StaticConnector {
    pub fn new(directory: StaticDirectory) -> Self {
        Self {
            directory: Arc::new(directory),
        }
    }
}

#[async_trait]
impl DirectoryConnector for StaticConnector {
    async fn connect(&self) -> Result<Box<dyn AddressDirectory>, DirectoryError> {
        Ok(Box::new(StaticDirectory::clone(&self.directory)))
    }
}
