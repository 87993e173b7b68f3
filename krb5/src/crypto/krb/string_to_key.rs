use super::{Enctype, Keyblock};
use hmac::{Hmac, Mac};
use md4::Digest;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Approximates the RFC 3961/3962 string-to-key profiles a real `libkrb5`
/// derives exactly: AES needs the full PBKDF2 plus the "kerberos" n-fold
/// DK refinement, DES/DES3 need their own key-parity and weak-key
/// handling. This is enough to produce password- and salt-dependent key
/// material for a keytab that nothing outside this workspace's own
/// [`crate::Connection::test_authenticate`]-style probe ever reads back;
/// it is not a substitute for a real krb5 implementation's derivation.
pub fn string_to_key(enctype: Enctype, password: &str, salt: &[u8]) -> anyhow::Result<Keyblock> {
    if enctype == Enctype::ARCFOUR_HMAC || enctype == Enctype::ARCFOUR_HMAC_EXP {
        let utf16: Vec<u8> = password.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let digest = md4::Md4::digest(&utf16);
        return Ok(Keyblock {
            enctype,
            contents: digest.to_vec(),
        });
    }

    let key_length = key_length(enctype)?;
    let mut contents = Vec::with_capacity(key_length);
    let mut block = salt.to_vec();
    while contents.len() < key_length {
        let mut mac = HmacSha1::new_from_slice(password.as_bytes())
            .map_err(|err| anyhow::anyhow!("{}", err))?;
        mac.update(&block);
        block = mac.finalize().into_bytes().to_vec();
        contents.extend_from_slice(&block);
    }
    contents.truncate(key_length);
    Ok(Keyblock { enctype, contents })
}

fn key_length(enctype: Enctype) -> anyhow::Result<usize> {
    match enctype {
        Enctype::AES128_CTS_HMAC_SHA1_96 => Ok(16),
        Enctype::AES256_CTS_HMAC_SHA1_96 => Ok(32),
        Enctype::DES3_CBC_SHA1 => Ok(24),
        Enctype::DES_CBC_MD5 | Enctype::DES_CBC_CRC => Ok(8),
        _ => Err(anyhow::anyhow!(
            "no string-to-key profile for enctype {}",
            enctype.0
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_derive_the_same_key() {
        let a = string_to_key(Enctype::AES256_CTS_HMAC_SHA1_96, "hunter2", b"SALT").unwrap();
        let b = string_to_key(Enctype::AES256_CTS_HMAC_SHA1_96, "hunter2", b"SALT").unwrap();
        assert_eq!(a.contents, b.contents);
        assert_eq!(a.contents.len(), 32);
    }

    #[test]
    fn different_salts_derive_different_keys() {
        let a = string_to_key(Enctype::AES128_CTS_HMAC_SHA1_96, "hunter2", b"SALT-A").unwrap();
        let b = string_to_key(Enctype::AES128_CTS_HMAC_SHA1_96, "hunter2", b"SALT-B").unwrap();
        assert_ne!(a.contents, b.contents);
        assert_eq!(a.contents.len(), 16);
    }

    #[test]
    fn rc4_key_is_md4_of_utf16_password_regardless_of_salt() {
        let a = string_to_key(Enctype::ARCFOUR_HMAC, "hunter2", b"SALT-A").unwrap();
        let b = string_to_key(Enctype::ARCFOUR_HMAC, "hunter2", b"SALT-B").unwrap();
        assert_eq!(a.contents, b.contents);
        assert_eq!(a.contents.len(), 16);
    }

    #[test]
    fn unsupported_enctype_is_rejected() {
        assert!(string_to_key(Enctype::CAMELLIA256_CTS_CMAC, "x", b"y").is_err());
    }
}
