use crate::{connection::Entry, session::EnrollmentSession, JoinFlags};
use crate::{Error, Result};
use std::collections::BTreeSet;

const UAC_WORKSTATION_TRUST_ACCOUNT_DONT_EXPIRE_PASSWD: &str = "69632";

impl EnrollmentSession {
    /// Creates the computer account if it is absent; if present, either
    /// fails (no `ALLOW_OVERWRITE`) or reconciles only the attributes
    /// that actually differ.
    pub(crate) fn reconcile_computer_account(&mut self, flags: JoinFlags) -> Result<()> {
        let dn = self
            .computer_dn
            .clone()
            .ok_or_else(|| Error::Unexpected("computer DN is not set".to_owned()))?;
        let sam = self
            .computer_sam
            .clone()
            .ok_or_else(|| Error::Unexpected("computer SAM is not set".to_owned()))?;

        let mut target = Entry::new();
        target.insert("objectClass".to_owned(), singleton(b"computer"));
        target.insert("sAMAccountName".to_owned(), singleton(sam.as_bytes()));
        target.insert(
            "userAccountControl".to_owned(),
            singleton(UAC_WORKSTATION_TRUST_ACCOUNT_DONT_EXPIRE_PASSWD.as_bytes()),
        );
        prune_empty(&mut target);

        let attrs: Vec<&str> = target.keys().map(String::as_str).collect();
        let existing = self.connection.search(&dn, "(objectClass=computer)", &attrs)?;

        match existing {
            None => {
                self.connection.add(&dn, target)?;
                log::info!("created computer account '{}'", dn);
                self.computer_attributes = None;
            }
            Some(current) => {
                if !flags.contains(JoinFlags::ALLOW_OVERWRITE) {
                    return Err(Error::Config(format!(
                        "computer account '{}' already exists",
                        dn
                    )));
                }
                let mut changed = false;
                for (attr, values) in target {
                    if current.get(&attr) != Some(&values) {
                        self.connection.modify_replace(&dn, &attr, values)?;
                        changed = true;
                    }
                }
                if changed {
                    log::info!("updated computer account '{}'", dn);
                } else {
                    log::info!("computer account '{}' already matches", dn);
                }
            }
        }
        Ok(())
    }
}

fn singleton(value: &[u8]) -> BTreeSet<Vec<u8>> {
    let mut set = BTreeSet::new();
    set.insert(value.to_vec());
    set
}

fn prune_empty(entry: &mut Entry) {
    entry.retain(|_, values| !values.is_empty());
}
