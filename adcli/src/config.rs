//! Ambient configuration: resolves values a caller left unset from the
//! same `krb5.conf` [`krb5::Context`] already parses, rather than
//! inventing a second configuration format.

use krb5::Enctype;

/// An explicit value wins; otherwise falls back to whatever the profile
/// lookup (`[libdefaults] default_realm` via [`krb5::Context::profile`])
/// produced. Takes the already-resolved profile value rather than the
/// whole `Context` so it stays testable without a `krb5.conf` on disk.
pub fn resolve_default_realm(
    profile_default_realm: Option<&str>,
    explicit: Option<&str>,
) -> anyhow::Result<Vec<u8>> {
    match explicit.or(profile_default_realm) {
        Some(realm) => Ok(realm.as_bytes().to_vec()),
        None => Err(anyhow::anyhow!(
            "no domain realm given and none configured in krb5.conf"
        )),
    }
}

/// Default keytab path used when neither the caller nor `krb5.conf`'s
/// `[libdefaults] default_keytab_name` say otherwise. `krb5::Keytab`'s own
/// `default_name`/`client_default_name` remain unimplemented in this
/// workspace's `krb5` crate (see DESIGN.md), so this layer resolves the
/// common case itself instead of waiting on that.
pub const FALLBACK_KEYTAB_NAME: &str = "/etc/krb5.keytab";

/// An explicit value wins; otherwise falls back to the profile's
/// `default_keytab_name`, otherwise [`FALLBACK_KEYTAB_NAME`].
pub fn resolve_default_keytab_name(
    profile_default_keytab_name: Option<&str>,
    explicit: Option<&str>,
) -> String {
    explicit
        .or(profile_default_keytab_name)
        .unwrap_or(FALLBACK_KEYTAB_NAME)
        .to_owned()
}

/// Filters the orchestrator's default enctype order down to what this
/// host's krb5 configuration actually allows, via the `allow_des3`/
/// `allow_rc4`/`allow_weak_crypto` flags `krb5::Context` resolves from
/// `[libdefaults]`. The result is seeded as a *derived* default (not
/// explicit), so a directory-declared `msDS-supportedEncryptionTypes`
/// still overrides it.
pub fn policy_enctypes(allow_des3: bool, allow_rc4: bool, allow_weak_crypto: bool) -> Vec<Enctype> {
    crate::session::default_enctypes()
        .into_iter()
        .filter(|enctype| match *enctype {
            Enctype::DES3_CBC_SHA1 => allow_des3,
            Enctype::ARCFOUR_HMAC => allow_rc4,
            Enctype::DES_CBC_MD5 | Enctype::DES_CBC_CRC => allow_weak_crypto,
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_realm_wins_over_profile() {
        let realm = resolve_default_realm(Some("PROFILE.COM"), Some("EXAMPLE.COM")).unwrap();
        assert_eq!(realm, b"EXAMPLE.COM".to_vec());
    }

    #[test]
    fn falls_back_to_profile_when_nothing_explicit() {
        let realm = resolve_default_realm(Some("PROFILE.COM"), None).unwrap();
        assert_eq!(realm, b"PROFILE.COM".to_vec());
    }

    #[test]
    fn neither_given_is_a_config_error() {
        assert!(resolve_default_realm(None, None).is_err());
    }

    #[test]
    fn policy_drops_weak_enctypes_by_default() {
        let enctypes = policy_enctypes(false, false, false);
        assert!(enctypes.contains(&Enctype::AES256_CTS_HMAC_SHA1_96));
        assert!(!enctypes.contains(&Enctype::ARCFOUR_HMAC));
        assert!(!enctypes.contains(&Enctype::DES3_CBC_SHA1));
        assert!(!enctypes.contains(&Enctype::DES_CBC_MD5));
        assert!(!enctypes.contains(&Enctype::DES_CBC_CRC));
    }

    #[test]
    fn policy_keeps_every_enctype_when_all_allowed() {
        let enctypes = policy_enctypes(true, true, true);
        assert_eq!(enctypes.len(), crate::session::default_enctypes().len());
    }

    #[test]
    fn keytab_name_falls_back_through_explicit_then_profile_then_default() {
        assert_eq!(
            resolve_default_keytab_name(Some("FILE:/srv/krb5.keytab"), Some("FILE:/opt/x.keytab")),
            "FILE:/opt/x.keytab"
        );
        assert_eq!(
            resolve_default_keytab_name(Some("FILE:/srv/krb5.keytab"), None),
            "FILE:/srv/krb5.keytab"
        );
        assert_eq!(resolve_default_keytab_name(None, None), FALLBACK_KEYTAB_NAME);
    }
}
