mod krb;

pub use self::krb::{string_to_key, Enctype, Keyblock, Keytype};
