use crate::{session::EnrollmentSession, Error, Result, Setting};
use krb5::{Keytab, KeytabEntry};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

impl EnrollmentSession {
    /// Writes a fresh key for every enctype of every principal in
    /// `keytab_principals`, pruning any entry left over from a previous
    /// key version first.
    pub(crate) fn sync_keytab(&mut self) -> Result<()> {
        self.ensure_keytab_open()?;
        let keytab = self
            .keytab
            .clone()
            .ok_or_else(|| Error::Unexpected("keytab is not open".to_owned()))?;

        let password: Zeroizing<String> = Zeroizing::new(
            self.computer_password
                .value()
                .ok_or_else(|| Error::Unexpected("computer password is not set".to_owned()))?
                .to_string(),
        );
        let enctypes = self
            .keytab_enctypes
            .value()
            .cloned()
            .unwrap_or_else(crate::session::default_enctypes);
        let keep_vno = self.kvno.saturating_sub(1);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);

        let principals = self.keytab_principals.clone();
        for principal in &principals {
            prune_stale(&keytab, principal, keep_vno)?;

            if self.which_salt.is_none() {
                let salt = self.discover_salt(principal, password.as_str())?;
                self.which_salt = Some(salt);
            }
            let salt = self
                .which_salt
                .clone()
                .expect("just set if it was absent");

            for enctype in &enctypes {
                let key = krb5::string_to_key(*enctype, password.as_str(), &salt)
                    .map_err(map_keytab_error)?;
                let entry = KeytabEntry {
                    principal: principal.clone(),
                    timestamp,
                    vno: self.kvno,
                    key,
                };
                keytab
                    .lock()
                    .expect("keytab mutex poisoned")
                    .add_entry(entry)
                    .map_err(map_keytab_error)?;
            }
        }
        let name = self.keytab_name.value().cloned().unwrap_or_default();
        log::info!(
            "synced {} principal(s) into keytab '{}' at vno {}",
            principals.len(),
            name,
            self.kvno
        );
        Ok(())
    }

    fn ensure_keytab_open(&mut self) -> Result<()> {
        if self.keytab.is_some() {
            return Ok(());
        }
        let name = self
            .keytab_name
            .value()
            .cloned()
            .unwrap_or_else(|| crate::config::FALLBACK_KEYTAB_NAME.to_owned());
        self.keytab_name_is_krb5 = !name.contains(':');
        let keytab = Keytab::resolve(&name).map_err(map_keytab_error)?;
        self.keytab = Some(keytab);
        if self.keytab_name.should_derive() {
            self.keytab_name = Setting::Derived(name);
        }
        Ok(())
    }
}

fn prune_stale(
    keytab: &Arc<Mutex<Keytab>>,
    principal: &krb5::Principal,
    keep_vno: krb5::Kvno,
) -> Result<()> {
    keytab
        .lock()
        .expect("keytab mutex poisoned")
        .remove_entries_except(principal, keep_vno)
        .map_err(map_keytab_error)
}

fn map_keytab_error(err: anyhow::Error) -> Error {
    Error::Fail(err.to_string())
}
