mod ldap_krb5;

#[cfg(test)]
pub(crate) mod fake;

pub use self::ldap_krb5::LdapKrb5Connection;

use crate::Result;
use krb5::Enctype;
use std::collections::{BTreeMap, BTreeSet};

/// A directory entry as handed back from a base-scope search: attribute
/// name to the set of raw values under it.
pub type Entry = BTreeMap<String, BTreeSet<Vec<u8>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginType {
    UserAccount,
    ComputerAccount,
}

impl Default for LoginType {
    fn default() -> Self {
        LoginType::ComputerAccount
    }
}

/// Discovers this host's own fully-qualified name the way the connection
/// layer would before handing a session to the orchestrator: the local
/// hostname, forward-resolved to an address and then reverse-resolved back
/// to a name, so a short or misconfigured `/etc/hostname` still yields a
/// DNS-canonical FQDN. Best-effort; `None` on any lookup failure leaves
/// `ensure_host_fqdn` to fall back to requiring an explicit `--host-fqdn`.
pub fn discover_host_fqdn() -> Option<String> {
    let hostname = dns_lookup::get_hostname().ok()?;
    let address = dns_lookup::lookup_host(&hostname).ok()?.into_iter().next()?;
    let fqdn = dns_lookup::lookup_addr(&address).ok()?;
    Some(fqdn.trim_end_matches('.').to_owned())
}

/// Everything the orchestrator needs from the lower-level connection layer:
/// naming context/realm discovery, a bound LDAP handle, and the two
/// Kerberos wire operations (set-password, test authentication) the core
/// itself never speaks directly. DNS SRV discovery, the actual SASL/GSSAPI
/// bind, and the RFC 3244 wire format are all external-collaborator
/// concerns; the orchestrator only ever calls through this trait, which is
/// what lets it be driven end-to-end by an in-memory fake in tests.
pub trait Connection {
    fn host_fqdn(&self) -> Option<&str>;
    fn naming_context(&self) -> &str;
    fn domain_realm(&self) -> &[u8];
    fn login_type(&self) -> LoginType;

    /// Base-scope search. Every search the core performs is
    /// base-scope, so the trait does not expose subtree/one-level scope.
    fn search(&mut self, base: &str, filter: &str, attrs: &[&str]) -> Result<Option<Entry>>;

    fn compare(&mut self, dn: &str, attr: &str, value: &str) -> Result<bool>;

    fn add(&mut self, dn: &str, attrs: Entry) -> Result<()>;

    fn modify_replace(&mut self, dn: &str, attr: &str, values: BTreeSet<Vec<u8>>) -> Result<()>;

    /// Administrative password reset via the caller's own ccache; does not
    /// require knowledge of the old password.
    fn set_password_ccache(&mut self, principal: &str, password: &str) -> Result<()>;

    /// Password change via the computer's own key (obtains a service
    /// ticket for `kadmin/changepw` using the computer's current key).
    fn set_password_as_computer(&mut self, principal: &str, password: &str) -> Result<()>;

    /// Attempts to obtain initial credentials for `principal` with
    /// `password` salted with `salt` under `enctype`. Used only by salt
    /// discovery.
    fn test_authenticate(
        &mut self,
        principal: &str,
        password: &str,
        enctype: Enctype,
        salt: &[u8],
    ) -> Result<bool>;

    fn clear_last_error(&mut self);
    fn last_error(&self) -> Option<&str>;
}
