use adcli::{connection::LdapKrb5Connection, EnrollmentSession, JoinFlags};
use clap::Parser;
use krb5::{prefix_progname_to_error_if_needed, Context};
use ldap3::LdapConn;
use std::process::ExitCode;

const PROGNAME: &str = "adcli-join";

#[derive(Parser)]
#[command(name = PROGNAME, version, about = "Enroll this host in an Active Directory domain")]
struct Args {
    /// LDAP URL of a domain controller, e.g. ldap://dc1.example.com
    #[arg(long)]
    ldap_url: String,
    /// Naming context (base DN) of the domain, e.g. DC=example,DC=com
    #[arg(long)]
    naming_context: String,
    /// Kerberos realm of the domain, e.g. EXAMPLE.COM. Falls back to
    /// `[libdefaults] default_realm` in krb5.conf if not given.
    #[arg(long)]
    domain_realm: Option<String>,

    /// Bind DN for the directory connection. A full implementation binds
    /// with GSSAPI using the caller's own credentials; this demo front
    /// end accepts a simple bind instead.
    #[arg(long)]
    bind_dn: Option<String>,
    #[arg(long)]
    bind_password: Option<String>,

    /// Fully-qualified hostname of this computer, if not the local one.
    #[arg(long)]
    host_fqdn: Option<String>,
    /// Computer (short, pre-Windows 2000) name, if not derived from the FQDN.
    #[arg(long)]
    computer_name: Option<String>,
    /// Organizational unit to join into, if not the directory's default.
    #[arg(long)]
    domain_ou: Option<String>,
    /// Explicit computer account password instead of a generated one.
    #[arg(long)]
    computer_password: Option<String>,
    /// Derive the password the way a password reset would, instead of
    /// generating a random one.
    #[arg(long, default_value_t = false)]
    reset_password: bool,

    /// Keytab to write, e.g. FILE:/etc/krb5.keytab or MEMORY:test.
    #[arg(long)]
    keytab_file: Option<String>,
    /// Allow overwriting an existing computer account.
    #[arg(long, default_value_t = false)]
    allow_overwrite: bool,
    /// Skip the keytab step entirely.
    #[arg(long, default_value_t = false)]
    no_keytab: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    prefix_progname_to_error_if_needed(PROGNAME, run(&args), false)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut ldap = LdapConn::new(&args.ldap_url)?;
    if let (Some(dn), Some(password)) = (&args.bind_dn, &args.bind_password) {
        ldap.simple_bind(dn, password)?.success()?;
    }

    let krb5_context = Context::init()?;
    let host_fqdn = args
        .host_fqdn
        .clone()
        .or_else(adcli::connection::discover_host_fqdn);
    let profile_default_realm = krb5_context.profile.get_string("libdefaults.default_realm");
    let profile_default_keytab_name = krb5_context
        .profile
        .get_string("libdefaults.default_keytab_name");
    let domain_realm = adcli::config::resolve_default_realm(
        profile_default_realm.as_deref(),
        args.domain_realm.as_deref(),
    )?;
    let enctype_policy = adcli::config::policy_enctypes(
        krb5_context.allow_des3,
        krb5_context.allow_rc4,
        krb5_context.allow_weak_crypto,
    );
    let connection = LdapKrb5Connection::new(
        ldap,
        krb5_context,
        args.naming_context.clone(),
        domain_realm,
        host_fqdn,
        adcli::connection::LoginType::default(),
    );

    let mut session = EnrollmentSession::new(Box::new(connection));
    session.set_default_enctype_policy(enctype_policy);
    if let Some(fqdn) = &args.host_fqdn {
        session.set_host_fqdn(fqdn);
    }
    if let Some(name) = &args.computer_name {
        session.set_computer_name(name);
    }
    if let Some(ou) = &args.domain_ou {
        session.set_preferred_ou(ou);
    }
    if let Some(password) = &args.computer_password {
        session.set_computer_password(password);
    }
    session.set_reset_password(args.reset_password);
    let profile_default_keytab = profile_default_keytab_name.as_deref();
    session.set_keytab_name(&adcli::config::resolve_default_keytab_name(
        profile_default_keytab,
        args.keytab_file.as_deref(),
    ));

    let mut flags = JoinFlags::empty();
    if args.allow_overwrite {
        flags |= JoinFlags::ALLOW_OVERWRITE;
    }
    if args.no_keytab {
        flags |= JoinFlags::NO_KEYTAB;
    }

    session.join(flags)?;
    println!(
        "joined {} as {}",
        session.computer_dn().unwrap_or("<unknown>"),
        session.computer_sam().unwrap_or("<unknown>"),
    );
    Ok(())
}
