use super::{Entry, LoginType};
use crate::{Error, Result};
use krb5::Enctype;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// In-memory directory + password vault, standing in for a live AD domain
/// in tests. A process-local map keyed by identity, mutated directly
/// instead of over the wire.
#[derive(Debug, Default)]
pub(crate) struct FakeConnection {
    pub(crate) host_fqdn: Option<String>,
    pub(crate) naming_context: String,
    pub(crate) domain_realm: Vec<u8>,
    pub(crate) login_type_value: LoginType,
    pub(crate) entries: HashMap<String, Entry>,
    /// Lowercased because AD LDAP compares are case-insensitive for the
    /// attributes this fake exercises (objectClass, cn).
    pub(crate) object_classes: HashMap<String, String>,
    pub(crate) passwords: HashMap<String, String>,
    /// The single salt this fake considers "correct" for every principal;
    /// `test_authenticate` succeeds only when called with it.
    pub(crate) correct_salt: Vec<u8>,
    pub(crate) add_calls: Vec<String>,
    pub(crate) modify_calls: Vec<(String, String)>,
    pub(crate) last_error: Option<String>,
    pub(crate) fail_modify_attr: Option<String>,
    /// Distinguishes which credential path a test run actually took.
    pub(crate) ccache_password_calls: Vec<String>,
    pub(crate) computer_password_calls: Vec<String>,
}

impl FakeConnection {
    pub(crate) fn new(naming_context: &str, domain_realm: &[u8]) -> Self {
        Self {
            naming_context: naming_context.to_owned(),
            domain_realm: domain_realm.to_owned(),
            ..Default::default()
        }
    }

    pub(crate) fn with_host_fqdn(mut self, fqdn: &str) -> Self {
        self.host_fqdn = Some(fqdn.to_owned());
        self
    }

    pub(crate) fn with_login_type(mut self, login_type: LoginType) -> Self {
        self.login_type_value = login_type;
        self
    }

    pub(crate) fn seed_container(&mut self, dn: &str, object_class: &str) {
        self.object_classes
            .insert(dn.to_ascii_lowercase(), object_class.to_owned());
    }

    pub(crate) fn seed_entry(&mut self, dn: &str, entry: Entry) {
        self.entries.insert(dn.to_ascii_lowercase(), entry);
    }
}

impl super::Connection for FakeConnection {
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
        self.login_type_value
    }

    fn search(&mut self, base: &str, _filter: &str, attrs: &[&str]) -> Result<Option<Entry>> {
        let Some(full) = self.entries.get(&base.to_ascii_lowercase()) else {
            return Ok(None);
        };
        let mut projected = Entry::new();
        for attr in attrs {
            if let Some(values) = full.get(*attr) {
                projected.insert((*attr).to_owned(), values.clone());
            }
        }
        Ok(Some(projected))
    }

    fn compare(&mut self, dn: &str, attr: &str, value: &str) -> Result<bool> {
        if attr.eq_ignore_ascii_case("objectClass") {
            return Ok(self
                .object_classes
                .get(&dn.to_ascii_lowercase())
                .map(|class| class.eq_ignore_ascii_case(value))
                .unwrap_or(false));
        }
        Ok(false)
    }

    fn add(&mut self, dn: &str, attrs: Entry) -> Result<()> {
        let key = dn.to_ascii_lowercase();
        if self.entries.contains_key(&key) {
            return Err(Error::Directory("already exists".to_owned()));
        }
        self.add_calls.push(dn.to_owned());
        self.entries.insert(key, attrs);
        Ok(())
    }

    fn modify_replace(&mut self, dn: &str, attr: &str, values: BTreeSet<Vec<u8>>) -> Result<()> {
        if self.fail_modify_attr.as_deref() == Some(attr) {
            return Err(Error::Directory(format!(
                "simulated failure replacing {}",
                attr
            )));
        }
        self.modify_calls.push((dn.to_owned(), attr.to_owned()));
        let key = dn.to_ascii_lowercase();
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(BTreeMap::new);
        entry.insert(attr.to_owned(), values);
        Ok(())
    }

    fn set_password_ccache(&mut self, principal: &str, password: &str) -> Result<()> {
        self.ccache_password_calls.push(principal.to_owned());
        self.passwords
            .insert(principal.to_owned(), password.to_owned());
        Ok(())
    }

    fn set_password_as_computer(&mut self, principal: &str, password: &str) -> Result<()> {
        self.computer_password_calls.push(principal.to_owned());
        self.passwords
            .insert(principal.to_owned(), password.to_owned());
        Ok(())
    }

    fn test_authenticate(
        &mut self,
        principal: &str,
        password: &str,
        _enctype: Enctype,
        salt: &[u8],
    ) -> Result<bool> {
        let expected = match self.passwords.get(principal) {
            Some(password) => password,
            None => return Ok(false),
        };
        Ok(expected == password && salt == self.correct_salt.as_slice())
    }

    fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
