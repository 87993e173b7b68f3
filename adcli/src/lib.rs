//! Active Directory computer-account enrollment: name and password
//! derivation, account-location discovery, directory reconciliation,
//! credential setting, post-creation attribute reconciliation, and keytab
//! synchronization with salt auto-detection.

mod attributes;
pub mod config;
pub mod connection;
mod credential;
mod error;
mod keytab_sync;
mod location;
mod naming;
mod password;
mod reconcile;
mod salt;
mod session;
mod setting;

pub use self::{
    connection::{Connection, Entry, LoginType},
    error::{Error, Result},
    session::{default_enctypes, EnrollmentSession, JoinFlags},
    setting::Setting,
};

#[cfg(test)]
mod tests;
