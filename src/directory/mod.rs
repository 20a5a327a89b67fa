//! Address directory: answers "is this a deliverable mailbox?".
//!
//! A connector opens one connection per invocation; the connection is
//! queried once per recipient and closed when the invocation ends.

pub mod ldap;
pub mod memory;

use async_trait::async_trait;

use crate::error::DirectoryError;

pub use ldap::LdapConnector;
pub use memory::{StaticConnector, StaticDirectory};

/// Outcome of a single directory lookup. Failures are `Err`, never a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found,
    NotFound,
}

impl Lookup {
    pub fn is_found(self) -> bool {
        matches!(self, Self::Found)
    }
}

/// An open directory connection.
#[async_trait]
pub trait AddressDirectory: Send + Sync {
    /// Query the directory for `address`. Issues exactly one query.
    async fn lookup(&self, address: &str) -> Result<Lookup, DirectoryError>;

    /// Whether `address` is a known mailbox.
    async fn exists(&self, address: &str) -> Result<bool, DirectoryError> {
        Ok(self.lookup(address).await?.is_found())
    }

    /// Release the connection. Errors are logged by the implementation.
    async fn close(&self);
}

/// Opens directory connections.
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn AddressDirectory>, DirectoryError>;
}
