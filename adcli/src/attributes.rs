use crate::{session::EnrollmentSession, Error, Result};
use krb5::Enctype;
use std::collections::BTreeSet;

const RETRIEVED_ATTRS: &[&str] = &[
    "msDS-KeyVersionNumber",
    "msDS-supportedEncryptionTypes",
    "dNSHostName",
    "servicePrincipalName",
];

impl EnrollmentSession {
    /// Re-reads the account we just created or reconciled so later steps
    /// work from the directory's own view of it.
    pub(crate) fn retrieve_computer_account_info(&mut self) -> Result<()> {
        let dn = self
            .computer_dn
            .clone()
            .ok_or_else(|| Error::Unexpected("computer DN is not set".to_owned()))?;
        let entry = self
            .connection
            .search(&dn, "(objectClass=computer)", RETRIEVED_ATTRS)?
            .ok_or_else(|| Error::Directory(format!("computer account '{}' vanished", dn)))?;

        self.kvno = entry
            .get("msDS-KeyVersionNumber")
            .and_then(|set| set.iter().next())
            .map(|bytes| {
                std::str::from_utf8(bytes)
                    .ok()
                    .and_then(|text| text.parse::<u32>().ok())
                    .ok_or_else(|| Error::Directory("malformed msDS-KeyVersionNumber".to_owned()))
            })
            .transpose()?
            .unwrap_or(0);

        self.computer_attributes = Some(entry);
        Ok(())
    }

    /// Best-effort post-join attribute reconciliation: each piece is
    /// attempted independently and a failure is only logged, never
    /// propagated, so a partial failure still leaves the account usable.
    pub(crate) fn update_computer_attributes(&mut self) {
        if let Err(err) = self.update_and_calculate_enctypes() {
            log::warn!("failed to update supported encryption types: {}", err);
        }
        if let Err(err) = self.update_dns_host_name() {
            log::warn!("failed to update dNSHostName: {}", err);
        }
        if let Err(err) = self.update_service_principals() {
            log::warn!("failed to update servicePrincipalName: {}", err);
        }
    }

    fn update_and_calculate_enctypes(&mut self) -> Result<()> {
        if !self.keytab_enctypes.is_explicit() {
            if let Some(mask) = self.directory_enctype_mask() {
                if let Some(enctypes) = decode_enctype_mask(mask) {
                    self.keytab_enctypes.set_derived(enctypes);
                } else {
                    log::warn!(
                        "directory's msDS-supportedEncryptionTypes ({}) has no recognized bits; keeping defaults",
                        mask
                    );
                }
            }
        }

        let enctypes = self
            .keytab_enctypes
            .value()
            .cloned()
            .unwrap_or_else(crate::session::default_enctypes);
        let desired_mask: u32 = enctypes.iter().filter_map(|e| enctype_bit(*e)).fold(0, |a, b| a | b);
        let current_mask = self.directory_enctype_mask().unwrap_or(0);
        if desired_mask == current_mask {
            return Ok(());
        }

        let dn = self
            .computer_dn
            .clone()
            .ok_or_else(|| Error::Unexpected("computer DN is not set".to_owned()))?;
        let mut values = BTreeSet::new();
        values.insert(desired_mask.to_string().into_bytes());
        self.connection
            .modify_replace(&dn, "msDS-supportedEncryptionTypes", values.clone())?;
        if let Some(entry) = self.computer_attributes.as_mut() {
            entry.insert("msDS-supportedEncryptionTypes".to_owned(), values);
        }
        Ok(())
    }

    fn update_dns_host_name(&mut self) -> Result<()> {
        let fqdn = match self.host_fqdn.value() {
            Some(fqdn) => fqdn.clone(),
            None => return Ok(()),
        };
        let current = self
            .computer_attributes
            .as_ref()
            .and_then(|entry| entry.get("dNSHostName"))
            .and_then(|set| set.iter().next())
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .map(str::to_owned);
        if current.as_deref() == Some(fqdn.as_str()) {
            return Ok(());
        }

        let dn = self
            .computer_dn
            .clone()
            .ok_or_else(|| Error::Unexpected("computer DN is not set".to_owned()))?;
        let mut values = BTreeSet::new();
        values.insert(fqdn.clone().into_bytes());
        self.connection
            .modify_replace(&dn, "dNSHostName", values.clone())?;
        if let Some(entry) = self.computer_attributes.as_mut() {
            entry.insert("dNSHostName".to_owned(), values);
        }
        Ok(())
    }

    fn update_service_principals(&mut self) -> Result<()> {
        let desired: BTreeSet<Vec<u8>> = self
            .service_principal_names
            .value()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(String::into_bytes)
            .collect();
        let current = self
            .computer_attributes
            .as_ref()
            .and_then(|entry| entry.get("servicePrincipalName"))
            .cloned()
            .unwrap_or_default();
        if current == desired {
            return Ok(());
        }

        let dn = self
            .computer_dn
            .clone()
            .ok_or_else(|| Error::Unexpected("computer DN is not set".to_owned()))?;
        self.connection
            .modify_replace(&dn, "servicePrincipalName", desired.clone())?;
        if let Some(entry) = self.computer_attributes.as_mut() {
            entry.insert("servicePrincipalName".to_owned(), desired);
        }
        Ok(())
    }

    fn directory_enctype_mask(&self) -> Option<u32> {
        let bytes = self
            .computer_attributes
            .as_ref()?
            .get("msDS-supportedEncryptionTypes")?
            .iter()
            .next()?;
        std::str::from_utf8(bytes).ok()?.parse().ok()
    }
}

/// AD's `msDS-supportedEncryptionTypes` bitmask assigns its own bit per
/// enctype; it does not reuse the Kerberos wire enctype numbers.
/// `DES3_CBC_SHA1` has no AD bit and is never reported or requested
/// through this attribute.
fn enctype_bit(enctype: Enctype) -> Option<u32> {
    match enctype {
        Enctype::DES_CBC_CRC => Some(0x1),
        Enctype::DES_CBC_MD5 => Some(0x2),
        Enctype::ARCFOUR_HMAC => Some(0x4),
        Enctype::AES128_CTS_HMAC_SHA1_96 => Some(0x8),
        Enctype::AES256_CTS_HMAC_SHA1_96 => Some(0x10),
        _ => None,
    }
}

fn decode_enctype_mask(mask: u32) -> Option<Vec<Enctype>> {
    let mut enctypes = vec![];
    if mask & 0x10 != 0 {
        enctypes.push(Enctype::AES256_CTS_HMAC_SHA1_96);
    }
    if mask & 0x8 != 0 {
        enctypes.push(Enctype::AES128_CTS_HMAC_SHA1_96);
    }
    if mask & 0x4 != 0 {
        enctypes.push(Enctype::ARCFOUR_HMAC);
    }
    if mask & 0x2 != 0 {
        enctypes.push(Enctype::DES_CBC_MD5);
    }
    if mask & 0x1 != 0 {
        enctypes.push(Enctype::DES_CBC_CRC);
    }
    if enctypes.is_empty() {
        None
    } else {
        Some(enctypes)
    }
}
