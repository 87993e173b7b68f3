use crate::{connection::Connection, Entry, Result, Setting};
use krb5::{Enctype, Keytab, Principal};
use log::info;
use std::sync::{Arc, Mutex};
use zeroize::Zeroizing;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct JoinFlags: u32 {
        /// Permit modifying an existing computer object.
        const ALLOW_OVERWRITE = 0b0000_0001;
        /// Skip keytab open and synchronization.
        const NO_KEYTAB = 0b0000_0010;
    }
}

/// Default enctype order, aes-strongest first, matching the order the
/// directory's `msDS-supportedEncryptionTypes` bitfield documents.
pub fn default_enctypes() -> Vec<Enctype> {
    vec![
        Enctype::AES256_CTS_HMAC_SHA1_96,
        Enctype::AES128_CTS_HMAC_SHA1_96,
        Enctype::DES3_CBC_SHA1,
        Enctype::ARCFOUR_HMAC,
        Enctype::DES_CBC_MD5,
        Enctype::DES_CBC_CRC,
    ]
}

/// The enrollment state machine's single aggregate: configuration, derived
/// state, the connection handle, and the keytab destination. One session
/// drives exactly one `join`; it is not thread-safe and not re-entrant.
pub struct EnrollmentSession {
    pub(crate) connection: Box<dyn Connection>,

    pub(crate) host_fqdn: Setting<String>,
    pub(crate) computer_name: Setting<String>,
    pub(crate) computer_sam: Option<String>,
    pub(crate) computer_password: Setting<Zeroizing<String>>,
    pub(crate) reset_password: bool,
    pub(crate) computer_principal: Option<Principal>,

    pub(crate) preferred_ou: Setting<String>,
    pub(crate) preferred_ou_validated: bool,
    pub(crate) computer_container: Option<String>,
    pub(crate) computer_dn: Option<String>,
    pub(crate) computer_attributes: Option<Entry>,

    pub(crate) service_names: Setting<Vec<String>>,
    pub(crate) service_principal_names: Setting<Vec<String>>,

    pub(crate) kvno: u32,

    pub(crate) keytab: Option<Arc<Mutex<Keytab>>>,
    pub(crate) keytab_name: Setting<String>,
    pub(crate) keytab_name_is_krb5: bool,
    pub(crate) keytab_principals: Vec<Principal>,
    pub(crate) keytab_enctypes: Setting<Vec<Enctype>>,
    pub(crate) which_salt: Option<Vec<u8>>,

    pub(crate) refs: u32,
}

impl EnrollmentSession {
    pub fn new(connection: Box<dyn Connection>) -> Self {
        Self {
            connection,
            host_fqdn: Setting::Derive,
            computer_name: Setting::Derive,
            computer_sam: None,
            computer_password: Setting::Derive,
            reset_password: false,
            computer_principal: None,
            preferred_ou: Setting::Absent,
            preferred_ou_validated: false,
            computer_container: None,
            computer_dn: None,
            computer_attributes: None,
            service_names: Setting::Derive,
            service_principal_names: Setting::Derive,
            kvno: 0,
            keytab: None,
            keytab_name: Setting::Derive,
            keytab_name_is_krb5: false,
            keytab_principals: vec![],
            keytab_enctypes: Setting::Derive,
            which_salt: None,
            refs: 1,
        }
    }

    pub fn reference(&mut self) {
        self.refs += 1;
    }

    /// Idempotent; safe to call between retries. Drops every piece of
    /// derived state but keeps caller-provided explicit values.
    pub fn enroll_clear_state(&mut self) {
        self.host_fqdn.clear_if_not_explicit();
        self.computer_name.clear_if_not_explicit();
        self.computer_sam = None;
        self.computer_password.clear_if_not_explicit();
        self.computer_principal = None;
        self.preferred_ou.clear_if_not_explicit();
        self.preferred_ou_validated = false;
        self.computer_container = None;
        self.computer_dn = None;
        self.computer_attributes = None;
        self.service_names.clear_if_not_explicit();
        self.service_principal_names.clear_if_not_explicit();
        self.keytab_principals.clear();
        self.keytab_enctypes.clear_if_not_explicit();
        self.which_salt = None;
        self.kvno = 0;
    }

    pub fn set_preferred_ou(&mut self, ou: &str) {
        self.preferred_ou.set_explicit(ou.to_owned());
        self.preferred_ou_validated = false;
    }

    pub fn set_host_fqdn(&mut self, fqdn: &str) {
        self.host_fqdn.set_explicit(fqdn.to_owned());
    }

    pub fn set_computer_name(&mut self, name: &str) {
        self.computer_name.set_explicit(name.to_owned());
    }

    pub fn set_computer_password(&mut self, password: &str) {
        self.computer_password
            .set_explicit(Zeroizing::new(password.to_owned()));
    }

    pub fn set_reset_password(&mut self, reset: bool) {
        self.reset_password = reset;
    }

    pub fn set_keytab_name(&mut self, name: &str) {
        self.keytab_name.set_explicit(name.to_owned());
    }

    pub fn set_keytab_enctypes(&mut self, enctypes: Vec<Enctype>) {
        self.keytab_enctypes.set_explicit(enctypes);
    }

    /// Seeds the enctype default from ambient krb5 configuration without
    /// marking it explicit, so a directory-declared
    /// `msDS-supportedEncryptionTypes` can still override it. A no-op once
    /// the caller has pinned an explicit list or a previous call already
    /// seeded one.
    pub fn set_default_enctype_policy(&mut self, enctypes: Vec<Enctype>) {
        if self.keytab_enctypes.should_derive() {
            self.keytab_enctypes = Setting::Derived(enctypes);
        }
    }

    pub fn computer_dn(&self) -> Option<&str> {
        self.computer_dn.as_deref()
    }

    pub fn computer_sam(&self) -> Option<&str> {
        self.computer_sam.as_deref()
    }

    pub fn kvno(&self) -> u32 {
        self.kvno
    }

    /// Derivation only; no network I/O that isn't already implied by the
    /// derivation stages themselves. Safe to re-run.
    pub fn prepare(&mut self) -> Result<()> {
        self.connection.clear_last_error();
        self.ensure_host_fqdn()?;
        self.ensure_computer_name()?;
        self.ensure_computer_sam()?;
        self.ensure_computer_password()?;
        self.ensure_service_names()?;
        self.ensure_service_principals()?;
        Ok(())
    }

    /// The full pipeline: discover -> prepare -> resolve location ->
    /// reconcile -> set password -> retrieve -> best-effort attribute
    /// updates -> keytab update (unless `NO_KEYTAB`).
    pub fn join(&mut self, flags: JoinFlags) -> Result<()> {
        self.connection.clear_last_error();
        self.enroll_clear_state();
        self.prepare()?;

        self.resolve_computer_location(flags)?;
        self.reconcile_computer_account(flags)?;
        self.set_computer_account_password()?;
        self.retrieve_computer_account_info()?;
        self.update_computer_attributes();

        if !flags.contains(JoinFlags::NO_KEYTAB) {
            self.sync_keytab()?;
        }

        info!(
            "enrolled {} at {}",
            self.computer_sam.as_deref().unwrap_or("<unknown>"),
            self.computer_dn.as_deref().unwrap_or("<unknown>")
        );
        Ok(())
    }
}

impl Drop for EnrollmentSession {
    fn drop(&mut self) {
        self.refs = self.refs.saturating_sub(1);
        // `computer_password` is a `Setting<Zeroizing<String>>`; dropping it
        // here (rather than waiting for the struct's default field drop
        // order) makes the scrub-on-teardown guarantee explicit.
        self.computer_password = Setting::Absent;
    }
}
