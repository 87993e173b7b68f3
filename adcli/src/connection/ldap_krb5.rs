use super::{Entry, LoginType};
use crate::{Error, Result};
use krb5::Enctype;
use ldap3::{LdapConn, Mod, Scope, SearchEntry};
use std::collections::{BTreeSet, HashSet};

/// Default connection, backed by a synchronous `ldap3::LdapConn` for
/// directory operations and a `krb5::Context` for realm/profile lookups.
///
/// DNS SRV discovery and the GSSAPI bind itself are performed by callers
/// before constructing this type (handing in an already-bound `LdapConn`);
/// the Kerberos wire operations (`set_password_*`, `test_authenticate`)
/// require a native `libkrb5`-level AS-REQ/kpasswd implementation that this
/// pure-Rust workspace does not carry, so they report `Error::Fail` rather
/// than silently no-op. A full implementation swaps this type out for one
/// backed by such a library without the orchestrator changing at all.
pub struct LdapKrb5Connection {
    ldap: LdapConn,
    krb5_context: krb5::Context,
    naming_context: String,
    domain_realm: Vec<u8>,
    host_fqdn: Option<String>,
    login_type: LoginType,
    last_error: Option<String>,
}

impl LdapKrb5Connection {
    pub fn new(
        ldap: LdapConn,
        krb5_context: krb5::Context,
        naming_context: String,
        domain_realm: Vec<u8>,
        host_fqdn: Option<String>,
        login_type: LoginType,
    ) -> Self {
        Self {
            ldap,
            krb5_context,
            naming_context,
            domain_realm,
            host_fqdn,
            login_type,
            last_error: None,
        }
    }

    pub fn krb5_context(&mut self) -> &mut krb5::Context {
        &mut self.krb5_context
    }
}

impl super::Connection for LdapKrb5Connection {
    fn host_fqdn(&self) -> Option<&str> {
        self.host_fqdn.as_deref()
    }

    fn naming_context(&self) -> &str {
        &self.naming_context
    }

    fn domain_realm(&self) -> &[u8] {
        &self.domain_realm
    }

    fn login_type(&self) -> LoginType {
        self.login_type
    }

    fn search(&mut self, base: &str, filter: &str, attrs: &[&str]) -> Result<Option<Entry>> {
        let (results, _) = self
            .ldap
            .search(base, Scope::Base, filter, attrs)
            .and_then(|result| result.success())
            .map_err(|err| {
                let message = err.to_string();
                self.last_error = Some(message.clone());
                Error::Directory(message)
            })?;
        let Some(result_entry) = results.into_iter().next() else {
            return Ok(None);
        };
        let entry = SearchEntry::construct(result_entry);
        let mut attrs: Entry = Entry::new();
        for (name, values) in entry.attrs {
            attrs
                .entry(name)
                .or_default()
                .extend(values.into_iter().map(String::into_bytes));
        }
        for (name, values) in entry.bin_attrs {
            attrs.entry(name).or_default().extend(values);
        }
        Ok(Some(attrs))
    }

    fn compare(&mut self, dn: &str, attr: &str, value: &str) -> Result<bool> {
        self.ldap.compare(dn, attr, value).map_err(|err| {
            let message = err.to_string();
            self.last_error = Some(message.clone());
            Error::Directory(message)
        })
    }

    fn add(&mut self, dn: &str, attrs: Entry) -> Result<()> {
        let owned: Vec<(String, HashSet<String>)> = attrs
            .into_iter()
            .map(|(name, values)| {
                (
                    name,
                    values
                        .into_iter()
                        .map(|v| String::from_utf8_lossy(&v).into_owned())
                        .collect(),
                )
            })
            .collect();
        self.ldap
            .add(dn, owned)
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(|err| {
                let message = err.to_string();
                self.last_error = Some(message.clone());
                classify_write_error(&message)
            })
    }

    fn modify_replace(&mut self, dn: &str, attr: &str, values: BTreeSet<Vec<u8>>) -> Result<()> {
        let values: HashSet<String> = values
            .into_iter()
            .map(|v| String::from_utf8_lossy(&v).into_owned())
            .collect();
        self.ldap
            .modify(dn, vec![Mod::Replace(attr, values)])
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(|err| {
                let message = err.to_string();
                self.last_error = Some(message.clone());
                classify_write_error(&message)
            })
    }

    fn set_password_ccache(&mut self, _principal: &str, _password: &str) -> Result<()> {
        Err(Error::Fail(
            "set-password via ccache requires a native Kerberos kpasswd client".to_owned(),
        ))
    }

    fn set_password_as_computer(&mut self, _principal: &str, _password: &str) -> Result<()> {
        Err(Error::Fail(
            "set-password via computer credentials requires a native Kerberos kpasswd client"
                .to_owned(),
        ))
    }

    fn test_authenticate(
        &mut self,
        _principal: &str,
        _password: &str,
        _enctype: Enctype,
        _salt: &[u8],
    ) -> Result<bool> {
        Err(Error::Fail(
            "salt test authentication requires a native Kerberos AS-REQ client".to_owned(),
        ))
    }

    fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// AD returns `OBJECT_CLASS_VIOLATION` when the caller lacks permission to
/// set certain hidden attributes rather than `INSUFFICIENT_ACCESS`; both
/// map to a credentials failure.
fn classify_write_error(message: &str) -> Error {
    let lower = message.to_ascii_lowercase();
    if lower.contains("insufficient access") || lower.contains("object class violation") {
        Error::Credentials(message.to_owned())
    } else {
        Error::Directory(message.to_owned())
    }
}
