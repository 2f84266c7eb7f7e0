mod config;

use std::fmt::Display;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ldapname_core::{ControlValue, CoreError, Dn, LdapUrl, SchemaCache};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "ldapname",
    version,
    about = "Inspect LDAP distinguished names, URLs and controls"
)]
struct Cli {
    /// Path to config file (default: ~/.config/ldapname/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a DN and show its RDNs
    Dn {
        text: String,
        /// Also print the DN with attribute types replaced by OIDs
        #[arg(long)]
        oid: bool,
    },
    /// Parse an LDAP URL and show its fields
    Url { text: String },
    /// Build an LDAP URL for a configured connection
    UrlFor {
        profile: String,
        /// Entry DN (defaults to the profile's base DN)
        #[arg(long)]
        dn: Option<String>,
    },
    /// Render a request control
    Control {
        oid: String,
        #[arg(long)]
        critical: bool,
        /// Control value as text
        #[arg(long)]
        value: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config loading logs through a bootstrap subscriber, since the
    // configured level is not known yet.
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn")?)
        .with_writer(std::io::stderr)
        .finish();
    let config = tracing::subscriber::with_default(bootstrap, || {
        AppConfig::load(cli.config.as_deref())
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.general.log_level)?)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    debug!(
        "{} connection profiles, {} extra attribute types",
        config.connections.len(),
        config.schema.attribute_types.len()
    );

    match cli.command {
        Command::Dn { text, oid } => show_dn(&config, &text, oid),
        Command::Url { text } => {
            show_url(&LdapUrl::parse(&text));
            Ok(())
        }
        Command::UrlFor { profile, dn } => url_for(&config, &profile, dn.as_deref()),
        Command::Control {
            oid,
            critical,
            value,
        } => show_control(&oid, critical, value),
    }
}

/// `RUST_LOG` if set, otherwise `default_level`.
fn env_filter(default_level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("Invalid log level '{default_level}'")),
    }
}

fn show_dn(config: &AppConfig, text: &str, oid: bool) -> Result<()> {
    let dn = Dn::parse(text).with_context(|| format!("Cannot parse DN '{text}'"))?;

    println!("dn:     {dn}");
    for (i, rdn) in dn.rdns().iter().enumerate() {
        println!("rdn[{i}]: {rdn}");
        for part in rdn.parts() {
            println!(
                "  {} = {}",
                part.attribute_type(),
                part.unescaped_value()
            );
        }
    }
    match dn.parent() {
        Some(parent) => println!("parent: {parent}"),
        None => println!("parent: (none)"),
    }
    if oid {
        let schema = config.schema_cache();
        println!("oid:    {}", dn.to_oid_string(&schema));
        for line in attribute_type_lines(&dn, &schema) {
            println!("  {line}");
        }
    }
    Ok(())
}

/// One line per distinct attribute type in `dn`: its OID and description
/// when the schema knows it.
fn attribute_type_lines(dn: &Dn, schema: &SchemaCache) -> Vec<String> {
    let mut seen = Vec::new();
    let mut lines = Vec::new();
    for part in dn.rdns().iter().flat_map(|rdn| rdn.parts()) {
        let name = part.attribute_type();
        if seen.contains(&name.to_lowercase()) {
            continue;
        }
        seen.push(name.to_lowercase());
        let line = match schema.get_attribute_type(name) {
            Some(at) => match &at.description {
                Some(desc) => format!("{name}: {} ({desc})", at.oid),
                None => format!("{name}: {}", at.oid),
            },
            None => format!("{name}: (unknown)"),
        };
        lines.push(line);
    }
    lines
}

fn show_url(url: &LdapUrl) {
    println!("protocol:   {}", field(url.protocol()));
    println!("host:       {}", field(url.host()));
    println!("port:       {}", field(url.port()));
    println!("dn:         {}", field(url.dn()));
    println!(
        "attributes: {}",
        field(url.attributes().map(|a| a.join(", ")))
    );
    println!("scope:      {}", field(url.scope()));
    println!("filter:     {}", field(url.filter()));
    println!("extensions: {}", field(url.extensions()));
    println!("url:        {url}");
}

fn field<T: Display>(value: Result<T, CoreError>) -> String {
    match value {
        Ok(v) => v.to_string(),
        Err(_) => "(absent)".to_string(),
    }
}

fn url_for(config: &AppConfig, profile_name: &str, dn: Option<&str>) -> Result<()> {
    for line in url_for_lines(config, profile_name, dn)? {
        println!("{line}");
    }
    Ok(())
}

fn url_for_lines(
    config: &AppConfig,
    profile_name: &str,
    dn: Option<&str>,
) -> Result<Vec<String>> {
    let profile = config
        .find_connection(profile_name)
        .ok_or_else(|| anyhow!("No connection profile named '{profile_name}'"))?;
    let settings = profile.to_connection_settings();

    let dn = match dn {
        Some(text) => Dn::parse(text).with_context(|| format!("Cannot parse DN '{text}'"))?,
        None => settings.base_dn.clone().unwrap_or_default(),
    };

    Ok(vec![
        LdapUrl::from_connection_and_dn(&settings, &dn).to_string(),
        format!("tls: {}", settings.tls_mode.label()),
    ])
}

fn show_control(oid: &str, critical: bool, value: Option<String>) -> Result<()> {
    let mut control = ControlValue::parse(oid)?;
    control.critical = critical;
    control.value = value.map(String::into_bytes);

    println!("control: {control}");
    if control.name.is_empty() {
        println!("name:    (unknown)");
    } else {
        println!("name:    {}", control.name);
    }
    Ok(())
}
