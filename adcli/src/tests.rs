use crate::{
    connection::{fake::FakeConnection, Entry, LoginType},
    session::{default_enctypes, EnrollmentSession},
    Error, JoinFlags, Setting,
};
use std::collections::BTreeSet;

const WELL_KNOWN_COMPUTERS: &str =
    "B:32:AA312825768811D1ADED00C04FD8D5CD:CN=Computers,DC=example,DC=com";

fn fresh_connection() -> FakeConnection {
    let mut connection = FakeConnection::new("DC=example,DC=com", b"EXAMPLE.COM")
        .with_host_fqdn("host1.example.com")
        .with_login_type(LoginType::ComputerAccount);

    let mut naming_context_entry = Entry::new();
    naming_context_entry.insert(
        "wellKnownObjects".to_owned(),
        singleton(WELL_KNOWN_COMPUTERS.as_bytes()),
    );
    connection.seed_entry("DC=example,DC=com", naming_context_entry);
    connection
}

fn new_session(connection: FakeConnection) -> EnrollmentSession {
    EnrollmentSession::new(Box::new(connection))
}

fn singleton(value: &[u8]) -> BTreeSet<Vec<u8>> {
    let mut set = BTreeSet::new();
    set.insert(value.to_vec());
    set
}

#[test]
fn fresh_join_creates_account_and_syncs_keytab() {
    let mut session = new_session(fresh_connection());
    session.set_computer_password("hunter2hunter2");
    session.set_keytab_name("MEMORY:s1");

    session.join(JoinFlags::empty()).unwrap();

    assert_eq!(session.computer_sam(), Some("HOST1$"));
    assert_eq!(
        session.computer_dn(),
        Some("CN=HOST1,CN=Computers,DC=example,DC=com")
    );

    let keytab = krb5::Keytab::resolve("MEMORY:s1").unwrap();
    let count = keytab
        .lock()
        .unwrap()
        .entries_iter()
        .unwrap()
        .collect::<anyhow::Result<Vec<_>>>()
        .unwrap()
        .len();
    assert_eq!(count, 5 * default_enctypes().len());
}

#[test]
fn rejoin_with_same_explicit_password_is_idempotent() {
    let mut session = new_session(fresh_connection());
    session.set_computer_password("hunter2hunter2");
    session.set_keytab_name("MEMORY:s2");
    session.join(JoinFlags::ALLOW_OVERWRITE).unwrap();

    session.join(JoinFlags::ALLOW_OVERWRITE).unwrap();

    let keytab = krb5::Keytab::resolve("MEMORY:s2").unwrap();
    let count = keytab
        .lock()
        .unwrap()
        .entries_iter()
        .unwrap()
        .collect::<anyhow::Result<Vec<_>>>()
        .unwrap()
        .len();
    assert_eq!(count, 5 * default_enctypes().len());
}

#[test]
fn enroll_clear_state_resets_salt_and_kvno() {
    let mut session = new_session(fresh_connection());
    session.set_computer_password("hunter2hunter2");
    session.set_keytab_name("MEMORY:s7");
    session.join(JoinFlags::empty()).unwrap();

    assert!(session.which_salt.is_some());
    assert_eq!(session.kvno, 0);
    session.kvno = 5;

    session.enroll_clear_state();

    assert!(session.which_salt.is_none());
    assert_eq!(session.kvno, 0);
}

#[test]
fn existing_account_without_overwrite_flag_fails() {
    let mut connection = fresh_connection();
    let mut existing = Entry::new();
    existing.insert("objectClass".to_owned(), singleton(b"computer"));
    connection.seed_entry("CN=HOST1,CN=Computers,DC=example,DC=com", existing);

    let mut session = new_session(connection);
    session.set_computer_password("hunter2hunter2");

    let err = session.join(JoinFlags::empty()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn invalid_fqdn_fails_before_any_directory_io() {
    let connection = fresh_connection().with_host_fqdn(".example.com");
    let mut session = new_session(connection);
    session.set_computer_password("hunter2hunter2");

    let err = session.join(JoinFlags::empty()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn user_login_type_join_succeeds_through_ccache_path() {
    let connection = fresh_connection().with_login_type(LoginType::UserAccount);
    let mut session = new_session(connection);
    session.set_computer_password("hunter2hunter2");
    session.set_keytab_name("MEMORY:s5");

    session.join(JoinFlags::empty()).unwrap();
}

#[test]
fn credential_dispatch_uses_the_connection_login_type() {
    use crate::connection::Connection;

    let mut ccache = fresh_connection().with_login_type(LoginType::UserAccount);
    ccache
        .set_password_ccache("HOST1$@EXAMPLE.COM", "hunter2hunter2")
        .unwrap();
    assert_eq!(ccache.ccache_password_calls.len(), 1);
    assert!(ccache.computer_password_calls.is_empty());

    let mut as_computer = fresh_connection().with_login_type(LoginType::ComputerAccount);
    as_computer
        .set_password_as_computer("HOST1$@EXAMPLE.COM", "hunter2hunter2")
        .unwrap();
    assert_eq!(as_computer.computer_password_calls.len(), 1);
    assert!(as_computer.ccache_password_calls.is_empty());
}

#[test]
fn partial_post_join_failure_does_not_fail_the_join() {
    let mut connection = fresh_connection();
    connection.fail_modify_attr = Some("dNSHostName".to_owned());
    let mut session = new_session(connection);
    session.set_computer_password("hunter2hunter2");
    session.set_keytab_name("MEMORY:s6");

    session.join(JoinFlags::empty()).unwrap();

    let keytab = krb5::Keytab::resolve("MEMORY:s6").unwrap();
    let count = keytab
        .lock()
        .unwrap()
        .entries_iter()
        .unwrap()
        .collect::<anyhow::Result<Vec<_>>>()
        .unwrap()
        .len();
    assert_eq!(count, 5 * default_enctypes().len());
}

#[test]
fn computer_sam_is_upper_name_dollar_in_domain_realm() {
    let mut session = new_session(fresh_connection());
    session.set_computer_password("hunter2hunter2");
    session.prepare().unwrap();

    assert_eq!(session.computer_sam(), Some("HOST1$"));
    let principal = session.computer_principal.as_ref().unwrap();
    assert_eq!(principal.realm, b"EXAMPLE.COM".to_vec());
    assert_eq!(principal.components, vec![b"HOST1$".to_vec()]);
}

#[test]
fn stale_keytab_entries_are_pruned_on_sync() {
    let mut session = new_session(fresh_connection());
    session.set_computer_password("hunter2hunter2");
    session.set_keytab_name("MEMORY:invariant5");
    session.prepare().unwrap();
    session.kvno = 5;

    // Populate the fake directory's password vault so salt discovery can
    // succeed, without running the full join pipeline.
    session.set_computer_account_password().unwrap();

    let principal = session.computer_principal.clone().unwrap();
    let keytab = krb5::Keytab::resolve("MEMORY:invariant5").unwrap();
    for vno in [2u32, 3, 4] {
        let key = krb5::string_to_key(krb5::Enctype::AES256_CTS_HMAC_SHA1_96, "stale", b"salt")
            .unwrap();
        keytab
            .lock()
            .unwrap()
            .add_entry(krb5::KeytabEntry {
                principal: principal.clone(),
                timestamp: 0,
                vno,
                key,
            })
            .unwrap();
    }

    session.sync_keytab().unwrap();

    let remaining: Vec<u32> = keytab
        .lock()
        .unwrap()
        .entries_iter()
        .unwrap()
        .collect::<anyhow::Result<Vec<_>>>()
        .unwrap()
        .iter()
        .filter(|e| e.principal.same_name(&principal))
        .map(|e| e.vno)
        .collect();
    assert!(!remaining.contains(&2));
    assert!(!remaining.contains(&3));
    assert!(remaining.contains(&4));
    assert!(remaining.contains(&5));
}

#[test]
fn enctype_policy_seeds_a_default_but_explicit_still_wins() {
    let mut session = new_session(fresh_connection());
    session.set_default_enctype_policy(vec![krb5::Enctype::AES256_CTS_HMAC_SHA1_96]);
    assert_eq!(
        session.keytab_enctypes.value().cloned(),
        Some(vec![krb5::Enctype::AES256_CTS_HMAC_SHA1_96])
    );

    session.set_keytab_enctypes(vec![krb5::Enctype::ARCFOUR_HMAC]);
    session.set_default_enctype_policy(vec![krb5::Enctype::AES256_CTS_HMAC_SHA1_96]);
    assert_eq!(
        session.keytab_enctypes.value().cloned(),
        Some(vec![krb5::Enctype::ARCFOUR_HMAC])
    );
}

#[test]
fn setting_explicit_survives_clear_but_derived_does_not() {
    let mut setting: Setting<String> = Setting::Derive;
    setting.set_derived("a".to_owned());
    setting.clear_if_not_explicit();
    assert!(matches!(setting, Setting::Derive));

    let mut setting: Setting<String> = Setting::Derive;
    setting.set_explicit("b".to_owned());
    setting.clear_if_not_explicit();
    assert_eq!(setting.value(), Some(&"b".to_owned()));
}
