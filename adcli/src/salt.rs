use crate::{session::EnrollmentSession, Error, Result};
use krb5::Principal;

impl EnrollmentSession {
    /// Tries the standard principal salt, then the Windows 2003
    /// computer-account salt, then the null salt, against every
    /// configured enctype, stopping at the first combination the
    /// directory accepts. Any non-success (including an error) is
    /// just "try the next candidate"; only exhausting every combination
    /// is a failure.
    pub(crate) fn discover_salt(&mut self, principal: &Principal, password: &str) -> Result<Vec<u8>> {
        let realm = self.connection.domain_realm().to_owned();
        let candidates = [
            standard_salt(principal),
            windows_2003_salt(&realm, principal),
            Vec::new(),
        ];
        let enctypes = self
            .keytab_enctypes
            .value()
            .cloned()
            .unwrap_or_else(crate::session::default_enctypes);
        let principal_name = principal
            .unparse_name()
            .map_err(|err| Error::Unexpected(err.to_string()))?;

        for candidate in &candidates {
            for enctype in &enctypes {
                match self
                    .connection
                    .test_authenticate(&principal_name, password, *enctype, candidate)
                {
                    Ok(true) => {
                        log::info!("discovered salt for '{}'", principal_name);
                        return Ok(candidate.clone());
                    }
                    _ => continue,
                }
            }
        }
        log::warn!("exhausted all salt candidates for '{}'", principal_name);
        Err(Error::Directory(format!(
            "could not determine the correct salt for '{}'",
            principal_name
        )))
    }
}

fn standard_salt(principal: &Principal) -> Vec<u8> {
    let mut salt = principal.realm.clone();
    for component in &principal.components {
        salt.extend_from_slice(component);
    }
    salt
}

/// Pre-2008 AD's salt for a computer account: `REALM` + `"host"` +
/// lowercase(computer name, trailing `$` stripped) + `.` +
/// lowercase(realm as DNS domain). Built from the principal's first
/// component, which for the computer principal is `NAME$` (discovery only
/// ever runs against that principal, never a service one).
fn windows_2003_salt(realm: &[u8], principal: &Principal) -> Vec<u8> {
    let mut salt = realm.to_vec();
    salt.extend_from_slice(b"host");
    if let Some(first) = principal.components.first() {
        let name = first.strip_suffix(b"$").unwrap_or(first.as_slice());
        salt.extend(name.iter().map(u8::to_ascii_lowercase));
    }
    salt.push(b'.');
    salt.extend(realm.iter().map(u8::to_ascii_lowercase));
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_2003_salt_strips_dollar_and_appends_dns_domain() {
        let principal = Principal::parse("HOST1$@EXAMPLE.COM").unwrap();
        let salt = windows_2003_salt(b"EXAMPLE.COM", &principal);
        assert_eq!(salt, b"EXAMPLE.COMhosthost1.example.com".to_vec());
    }
}
