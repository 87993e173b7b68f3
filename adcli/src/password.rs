use rand::RngCore;
use zeroize::Zeroizing;

const PASSWORD_LENGTH: usize = 120;
const PASSWORD_MIN: u8 = 32;
const PASSWORD_MAX: u8 = 122;

/// Fills a buffer with cryptographically random bytes, keeps only those
/// that fall in the closed ASCII range [32, 122], and repeats until the
/// required length accumulates.
pub fn generate_password() -> Zeroizing<String> {
    let mut out = Vec::with_capacity(PASSWORD_LENGTH);
    let mut rng = rand::thread_rng();
    let mut chunk = [0u8; PASSWORD_LENGTH];
    while out.len() < PASSWORD_LENGTH {
        rng.fill_bytes(&mut chunk);
        out.extend(
            chunk
                .iter()
                .copied()
                .filter(|b| (PASSWORD_MIN..=PASSWORD_MAX).contains(b)),
        );
    }
    out.truncate(PASSWORD_LENGTH);
    Zeroizing::new(String::from_utf8(out).expect("ASCII range is valid UTF-8"))
}

/// AD's documented deterministic reset-password rule for computer
/// accounts: MD4 of the lowercased account name (without trailing `$`)
/// encoded as UTF-16LE. Unverified against a live domain; see DESIGN.md
/// for the open-question resolution.
pub fn reset_password(computer_name: &str) -> Zeroizing<String> {
    let lowered = computer_name.to_ascii_lowercase();
    let utf16: Vec<u8> = lowered
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    let digest = md4::Md4::digest(&utf16);
    Zeroizing::new(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{:02x}", byte).expect("writing to a String cannot fail");
    }
    out
}

use md4::Digest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_password_matches_length_and_range() {
        let password = generate_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password
            .bytes()
            .all(|b| (PASSWORD_MIN..=PASSWORD_MAX).contains(&b)));
    }

    #[test]
    fn reset_password_is_deterministic() {
        let a = reset_password("HOST1");
        let b = reset_password("host1");
        assert_eq!(a.as_str(), b.as_str());
        assert_eq!(a.len(), 32);
    }
}
