use crate::{session::EnrollmentSession, Error, Result};
use krb5::Principal;

impl EnrollmentSession {
    /// Adopts the FQDN the connection layer discovered, unless the
    /// caller explicitly left it absent.
    pub(crate) fn ensure_host_fqdn(&mut self) -> Result<()> {
        if self.host_fqdn.should_derive() {
            if let Some(fqdn) = self.connection.host_fqdn() {
                self.host_fqdn.set_derived(fqdn.to_owned());
            }
        }
        Ok(())
    }

    /// Splits `host_fqdn` at its first `.`; the left portion, uppercased,
    /// becomes the short name. Fails *config* if the FQDN is missing,
    /// has no dot, or the dot is first or last.
    pub(crate) fn ensure_computer_name(&mut self) -> Result<()> {
        if !self.computer_name.should_derive() {
            return Ok(());
        }
        let fqdn = self.host_fqdn.value().ok_or_else(|| {
            Error::Config("a host FQDN is required to derive the computer name".to_owned())
        })?;
        let dot = fqdn
            .find('.')
            .ok_or_else(|| Error::Config(format!("host FQDN '{}' has no domain part", fqdn)))?;
        if dot == 0 || dot == fqdn.len() - 1 {
            return Err(Error::Config(format!(
                "host FQDN '{}' has a leading or trailing dot",
                fqdn
            )));
        }
        self.computer_name
            .set_derived(fqdn[..dot].to_ascii_uppercase());
        Ok(())
    }

    /// Formats `<NAME>$`, parses it into a principal, and reparents the
    /// principal into the domain realm.
    pub(crate) fn ensure_computer_sam(&mut self) -> Result<()> {
        self.computer_principal = None;
        let name = self
            .computer_name
            .value()
            .ok_or_else(|| Error::Config("computer name is not set".to_owned()))?;
        let sam = format!("{}$", name);
        let mut principal =
            Principal::parse(&sam).map_err(|err| Error::Unexpected(err.to_string()))?;
        principal.force_realm(self.connection.domain_realm());
        self.computer_sam = Some(sam);
        self.computer_principal = Some(principal);
        Ok(())
    }

    /// An explicit password is kept as-is; `reset_password` selects
    /// AD's deterministic reset-password derivation; otherwise a fresh
    /// 120-character random password is generated and stored as
    /// non-explicit, so it does not survive `enroll_clear_state`.
    pub(crate) fn ensure_computer_password(&mut self) -> Result<()> {
        if self.computer_password.is_explicit() {
            return Ok(());
        }
        if self.reset_password {
            let name = self
                .computer_name
                .value()
                .ok_or_else(|| Error::Config("computer name is not set".to_owned()))?;
            self.computer_password
                .set_derived(crate::password::reset_password(name));
        } else {
            self.computer_password
                .set_derived(crate::password::generate_password());
        }
        Ok(())
    }

    pub(crate) fn ensure_service_names(&mut self) -> Result<()> {
        if self.service_names.should_derive() {
            self.service_names
                .set_derived(vec!["HOST".to_owned(), "RestrictedKrbHost".to_owned()]);
        }
        Ok(())
    }

    /// Builds the service principal name strings and `keytab_principals`
    /// (computer principal first, then one parsed principal per
    /// service-name/FQDN pair), all reparented into the domain realm.
    pub(crate) fn ensure_service_principals(&mut self) -> Result<()> {
        if self.service_principal_names.should_derive() {
            let computer_name = self
                .computer_name
                .value()
                .ok_or_else(|| Error::Config("computer name is not set".to_owned()))?
                .clone();
            let service_names = self
                .service_names
                .value()
                .cloned()
                .unwrap_or_else(|| vec!["HOST".to_owned(), "RestrictedKrbHost".to_owned()]);

            let mut names = vec![];
            for service in &service_names {
                names.push(format!("{}/{}", service, computer_name));
                if let Some(fqdn) = self.host_fqdn.value() {
                    names.push(format!("{}/{}", service, fqdn));
                }
            }
            self.service_principal_names.set_derived(names);
        }

        let computer_principal = self
            .computer_principal
            .clone()
            .ok_or_else(|| Error::Unexpected("computer principal is not set".to_owned()))?;
        let realm = self.connection.domain_realm().to_owned();

        let mut principals = vec![computer_principal];
        for name in self
            .service_principal_names
            .value()
            .cloned()
            .unwrap_or_default()
        {
            let principal = Principal::parse(&name)
                .map_err(|err| {
                    Error::Config(format!("invalid service principal '{}': {}", name, err))
                })?
                .with_realm(&realm);
            principals.push(principal);
        }
        self.keytab_principals = principals;
        Ok(())
    }
}
