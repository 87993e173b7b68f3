use crate::{connection::Entry, session::EnrollmentSession, JoinFlags};
use crate::{Error, Result};

const WELL_KNOWN_COMPUTERS_PREFIX: &str = "B:32:AA312825768811D1ADED00C04FD8D5CD:";

impl EnrollmentSession {
    pub(crate) fn resolve_computer_location(&mut self, _flags: JoinFlags) -> Result<()> {
        self.ensure_preferred_ou()?;
        self.lookup_computer_container()?;
        self.calc_computer_account()?;
        Ok(())
    }

    /// If the caller supplied a preferred OU, validate it once; otherwise
    /// ask the directory which OU it prefers for new computer accounts.
    fn ensure_preferred_ou(&mut self) -> Result<()> {
        if self.preferred_ou.value().is_some() {
            if !self.preferred_ou_validated {
                self.validate_preferred_ou()?;
            }
            return Ok(());
        }
        self.lookup_preferred_ou()
    }

    fn validate_preferred_ou(&mut self) -> Result<()> {
        let ou = self
            .preferred_ou
            .value()
            .expect("checked by caller")
            .clone();
        if ou.eq_ignore_ascii_case(self.connection.naming_context()) {
            self.preferred_ou_validated = true;
            return Ok(());
        }
        if self.connection.compare(&ou, "objectClass", "organizationalUnit")? {
            self.preferred_ou_validated = true;
            Ok(())
        } else {
            Err(Error::Config(format!(
                "'{}' is not an organizational unit",
                ou
            )))
        }
    }

    /// Asks the naming context for any computer account's `preferredOU`
    /// attribute, falling back to the naming context itself. This
    /// mirrors a long-standing quirk: the filter matches on
    /// `objectClass=computer` rather than a container-specific attribute,
    /// so it is preserved as-is rather than "fixed".
    fn lookup_preferred_ou(&mut self) -> Result<()> {
        let naming_context = self.connection.naming_context().to_owned();
        let found = self
            .connection
            .search(&naming_context, "(objectClass=computer)", &["preferredOU"])?;
        let ou = found
            .and_then(|entry| first_value(&entry, "preferredOU"))
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| naming_context.clone());
        self.preferred_ou.set_derived(ou);
        self.preferred_ou_validated = true;
        Ok(())
    }

    /// Looks for AD's well-known-objects marker for the Computers
    /// container on the resolved OU; if absent, tries the conventional
    /// `CN=Computers,<ou>` DN directly (a base-scope approximation, since
    /// this crate's directory abstraction only supports base-scope
    /// search); if that also comes up empty, the OU itself is used.
    fn lookup_computer_container(&mut self) -> Result<()> {
        let ou = self
            .preferred_ou
            .value()
            .ok_or_else(|| Error::Unexpected("preferred OU is not set".to_owned()))?
            .clone();

        let entry = self
            .connection
            .search(&ou, "(objectClass=*)", &["wellKnownObjects"])?;
        if let Some(entry) = entry {
            if let Some(values) = entry.get("wellKnownObjects") {
                for value in values {
                    if let Ok(text) = std::str::from_utf8(value) {
                        if let Some(container) = text.strip_prefix(WELL_KNOWN_COMPUTERS_PREFIX) {
                            self.computer_container = Some(container.to_owned());
                            return Ok(());
                        }
                    }
                }
            }
        }

        let candidate = format!("CN=Computers,{}", ou);
        if self
            .connection
            .search(&candidate, "(&(objectClass=container)(cn=Computers))", &[])?
            .is_some()
        {
            self.computer_container = Some(candidate);
            return Ok(());
        }

        log::warn!(
            "no Computers container found under '{}'; joining directly into it",
            ou
        );
        self.computer_container = Some(ou);
        Ok(())
    }

    fn calc_computer_account(&mut self) -> Result<()> {
        let name = self
            .computer_name
            .value()
            .ok_or_else(|| Error::Unexpected("computer name is not set".to_owned()))?;
        let container = self
            .computer_container
            .as_ref()
            .ok_or_else(|| Error::Unexpected("computer container is not set".to_owned()))?;
        self.computer_dn = Some(format!("CN={},{}", name, container));
        Ok(())
    }
}

fn first_value<'a>(entry: &'a Entry, attr: &str) -> Option<Vec<u8>> {
    entry.get(attr).and_then(|set| set.iter().next()).cloned()
}
