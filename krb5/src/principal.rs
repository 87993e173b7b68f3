const REALM_SEP: char = '@';
const COMPONENT_SEP: char = '/';

/// Kerberos principal name type, as carried in the V2 keytab record format
/// and in `KRB-PRINCIPAL-NAME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameType(pub i32);

macro_rules! name_type {
    ($name:ident, $int:expr) => {
        pub const $name: NameType = NameType($int);
    };
}

impl NameType {
    name_type!(UNKNOWN, 0);
    name_type!(PRINCIPAL, 1);
    name_type!(SRV_INST, 2);
    name_type!(SRV_HST, 3);
    name_type!(SRV_XHST, 4);
    name_type!(UID, 5);
    name_type!(X500_PRINCIPAL, 6);
    name_type!(SMTP_NAME, 7);
    name_type!(ENTERPRISE_PRINCIPAL, 10);
    name_type!(WELLKNOWN, 11);
    name_type!(MS_PRINCIPAL, -128);
}

impl Default for NameType {
    fn default() -> Self {
        Self::PRINCIPAL
    }
}

/// A parsed Kerberos principal: realm plus an ordered list of name
/// components. Computer accounts have a single component, `NAME$`; service
/// principals have two, `SERVICE/host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub realm: Vec<u8>,
    pub components: Vec<Vec<u8>>,
    pub name_type: NameType,
}

impl Principal {
    /// Parses `name[@REALM]`, splitting on unescaped `/` and `@`. A trailing
    /// realm is kept as given; callers that need to pin the principal to a
    /// specific realm regardless of what was parsed call
    /// [`Principal::force_realm`] afterwards.
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        if name.is_empty() {
            return Err(anyhow::anyhow!("empty principal name"));
        }
        let (name_part, realm) = match split_unescaped(name, REALM_SEP) {
            Some((n, r)) => (n, r.to_owned()),
            None => (name, String::new()),
        };
        let components: Vec<Vec<u8>> = name_part
            .split(COMPONENT_SEP)
            .map(|c| unescape(c).into_bytes())
            .collect();
        if components.iter().any(|c| c.is_empty()) {
            return Err(anyhow::anyhow!("invalid principal name: {}", name));
        }
        let name_type = if components.len() > 1 {
            NameType::SRV_HST
        } else {
            NameType::PRINCIPAL
        };
        Ok(Self {
            realm: realm.into_bytes(),
            components,
            name_type,
        })
    }

    /// Overwrites the realm regardless of what was parsed or previously set.
    /// Every principal the orchestrator hands to the directory or the
    /// keytab is reparented into the domain realm this way.
    pub fn force_realm(&mut self, realm: &[u8]) {
        self.realm = realm.to_owned();
    }

    pub fn with_realm(mut self, realm: &[u8]) -> Self {
        self.force_realm(realm);
        self
    }

    pub fn unparse_name(&self) -> anyhow::Result<String> {
        let name = self
            .components
            .iter()
            .map(|c| escape(c))
            .collect::<anyhow::Result<Vec<String>>>()?
            .join(&COMPONENT_SEP.to_string());
        let realm = String::from_utf8(self.realm.clone())?;
        Ok(format!("{}{}{}", name, REALM_SEP, realm))
    }

    /// Set-equality on realm and components; used to match keytab entries
    /// by principal identity (vno and enctype are allowed to differ).
    pub fn same_name(&self, other: &Principal) -> bool {
        self.realm == other.realm && self.components == other.components
    }
}

fn split_unescaped(s: &str, sep: char) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == sep as u8 {
            return Some((&s[..i], &s[i + 1..]));
        }
        i += 1;
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn escape(component: &[u8]) -> anyhow::Result<String> {
    let s = std::str::from_utf8(component)?;
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '/' || c == '@' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_principal_and_forces_realm() {
        let mut p = Principal::parse("HOST/host1.example.com@OTHER.REALM").unwrap();
        assert_eq!(
            p.components,
            vec![b"HOST".to_vec(), b"host1.example.com".to_vec()]
        );
        assert_eq!(p.realm, b"OTHER.REALM".to_vec());
        p.force_realm(b"EXAMPLE.COM");
        assert_eq!(
            p.unparse_name().unwrap(),
            "HOST/host1.example.com@EXAMPLE.COM"
        );
    }

    #[test]
    fn parses_bare_name_without_realm() {
        let p = Principal::parse("HOST1$").unwrap();
        assert_eq!(p.components, vec![b"HOST1$".to_vec()]);
        assert!(p.realm.is_empty());
    }

    #[test]
    fn same_name_ignores_nothing_else() {
        let a = Principal::parse("HOST1$@EXAMPLE.COM").unwrap();
        let b = Principal::parse("HOST1$@EXAMPLE.COM").unwrap();
        assert!(a.same_name(&b));
        let c = Principal::parse("HOST2$@EXAMPLE.COM").unwrap();
        assert!(!a.same_name(&c));
    }
}
