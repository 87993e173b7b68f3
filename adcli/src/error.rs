/// The five error kinds the core distinguishes when a join stage fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Programmer or environment bug: unreachable Kerberos errors, malformed
    /// internal state. Not recoverable by retrying.
    #[error("unexpected error: {0}")]
    Unexpected(String),

    /// Generic failure with no more specific classification (keytab I/O).
    #[error("{0}")]
    Fail(String),

    /// The LDAP or Kerberos server said no, or directory data is malformed.
    #[error("couldn't reach directory: {0}")]
    Directory(String),

    /// Caller-provided or discovered configuration is internally
    /// inconsistent (invalid OU, unparseable SPN, missing FQDN).
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller's credentials are invalid or lack permission.
    #[error("credentials error: {0}")]
    Credentials(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<krb5::Error> for Error {
    fn from(err: krb5::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<&'static krb5::Error> for Error {
    fn from(err: &'static krb5::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<ldap3::LdapError> for Error {
    fn from(err: ldap3::LdapError) -> Self {
        Error::Directory(err.to_string())
    }
}
