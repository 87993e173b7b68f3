use crate::{connection::LoginType, session::EnrollmentSession, Error, Result};
use zeroize::Zeroizing;

impl EnrollmentSession {
    /// Pushes the computer password to the directory over the channel
    /// appropriate to how we authenticated: a signed-on user sets it
    /// through their own ccache, a computer (re-setting its own password)
    /// uses the computer-account path. Failure classification
    /// (directory vs credentials) is the connection implementation's job.
    pub(crate) fn set_computer_account_password(&mut self) -> Result<()> {
        let principal = self
            .computer_principal
            .as_ref()
            .ok_or_else(|| Error::Unexpected("computer principal is not set".to_owned()))?
            .unparse_name()
            .map_err(|err| Error::Unexpected(err.to_string()))?;
        let password: Zeroizing<String> = Zeroizing::new(
            self.computer_password
                .value()
                .ok_or_else(|| Error::Unexpected("computer password is not set".to_owned()))?
                .to_string(),
        );

        match self.connection.login_type() {
            LoginType::UserAccount => {
                self.connection
                    .set_password_ccache(&principal, password.as_str())?;
            }
            LoginType::ComputerAccount => {
                self.connection
                    .set_password_as_computer(&principal, password.as_str())?;
            }
        }
        log::info!("set password for '{}'", principal);
        Ok(())
    }
}
