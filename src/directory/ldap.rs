//! LDAP-backed directory. A recipient exists when `(mail=<address>)` matches
//! at least one entry below the configured base.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, ldap_escape};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::config::DirectoryConfig;
use crate::directory::{AddressDirectory, DirectoryConnector, Lookup};
use crate::error::DirectoryError;

/// Opens authenticated LDAP connections from a `DirectoryConfig`.
pub struct LdapConnector {
    config: DirectoryConfig,
}

impl LdapConnector {
    pub fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    async fn connect(&self) -> Result<Box<dyn AddressDirectory>, DirectoryError> {
        let url = self.config.url();
        let settings = LdapConnSettings::new().set_conn_timeout(self.config.query_timeout);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| DirectoryError::Connect {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        ldap3::drive!(conn);

        let bind_err = |reason: String| DirectoryError::Bind {
            dn: self.config.bind_dn.clone(),
            reason,
        };
        ldap.with_timeout(self.config.query_timeout)
            .simple_bind(&self.config.bind_dn, self.config.password.expose_secret())
            .await
            .map_err(|e| bind_err(e.to_string()))?
            .success()
            .map_err(|e| bind_err(e.to_string()))?;

        debug!(url = %url, dn = %self.config.bind_dn, "Bound to LDAP directory");

        Ok(Box::new(LdapDirectory {
            ldap,
            config: self.config.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One bound LDAP connection.
pub struct LdapDirectory {
    ldap: Ldap,
    config: DirectoryConfig,
    closed: AtomicBool,
}

/// Search filter matching entries whose `mail` attribute equals `address`.
pub fn mail_filter(address: &str) -> String {
    format!("(mail={})", ldap_escape(address))
}

#[async_trait]
impl AddressDirectory for LdapDirectory {
    async fn lookup(&self, address: &str) -> Result<Lookup, DirectoryError> {
        let filter = mail_filter(address);
        let query_err = |reason: String| DirectoryError::Query {
            address: address.to_string(),
            reason,
        };

        let mut ldap = self.ldap.clone();
        let (entries, _result) = ldap
            .with_timeout(self.config.query_timeout)
            .search(&self.config.base_dn, Scope::Subtree, &filter, vec!["mail"])
            .await
            .map_err(|e| query_err(e.to_string()))?
            .success()
            .map_err(|e| query_err(e.to_string()))?;

        debug!(filter = %filter, matches = entries.len(), "LDAP lookup");

        Ok(if entries.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::Found
        })
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut ldap = self.ldap.clone();
        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "LDAP unbind failed");
        }
    }
}
