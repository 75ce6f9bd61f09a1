//! `convene` -- convention lifecycle toolchain.
//!
//! Subcommands: key generation for link signing, offline link minting
//! and verification (support tooling), and the HTTP JSON API server.

mod config;
mod keyfiles;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use time::OffsetDateTime;

use convene_core::Role;
use convene_links::{CapabilityTokenIssuer, LinkError, LinkLifetime};

use config::Config;

/// Link lifetime flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LifetimeArg {
    Short,
    Long,
    TwoDays,
}

impl From<LifetimeArg> for LinkLifetime {
    fn from(arg: LifetimeArg) -> Self {
        match arg {
            LifetimeArg::Short => LinkLifetime::Short,
            LifetimeArg::Long => LinkLifetime::Long,
            LifetimeArg::TwoDays => LinkLifetime::TwoDays,
        }
    }
}

/// Convention lifecycle toolchain.
#[derive(Parser)]
#[command(name = "convene", version, about = "Convention lifecycle toolchain")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an Ed25519 keypair for link signing
    Keygen {
        /// Output file prefix (writes <prefix>.secret and <prefix>.pub)
        #[arg(long, default_value = "convene-link")]
        output: String,
    },

    /// Mint a convention-scoped magic link (support tooling)
    IssueLink {
        /// Path to the .secret signing key file
        #[arg(long)]
        key: PathBuf,
        /// Convention the link is bound to
        #[arg(long)]
        convention_id: String,
        /// Role the link grants (kebab-case, e.g. "beneficiary")
        #[arg(long)]
        role: String,
        /// Email the link is bound to
        #[arg(long)]
        email: String,
        /// Front-end route the link lands on
        #[arg(long, default_value = "signer-convention")]
        route: String,
        /// Link lifetime
        #[arg(long, default_value = "short", value_enum)]
        lifetime: LifetimeArg,
    },

    /// Verify a magic-link token and print its payload
    VerifyLink {
        /// Path to the .secret signing key file
        #[arg(long)]
        key: PathBuf,
        /// The token (the `jwt` query parameter value)
        token: String,
    },

    /// Start the HTTP JSON API server
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
        /// Path to the .secret signing key file
        #[arg(long)]
        key: PathBuf,
        /// JSON seed file for the in-memory backend
        #[arg(long)]
        seed: Option<PathBuf>,
        /// TLS certificate path (PEM; requires the 'tls' feature)
        #[arg(long)]
        tls_cert: Option<PathBuf>,
        /// TLS private key path (PEM; requires the 'tls' feature)
        #[arg(long)]
        tls_key: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Keygen { output } => cmd_keygen(&output),
        Commands::IssueLink {
            key,
            convention_id,
            role,
            email,
            route,
            lifetime,
        } => cmd_issue_link(
            &config,
            &key,
            &convention_id,
            &role,
            &email,
            &route,
            lifetime.into(),
        ),
        Commands::VerifyLink { key, token } => cmd_verify_link(&config, &key, &token),
        Commands::Serve {
            port,
            key,
            seed,
            tls_cert,
            tls_key,
        } => cmd_serve(&config, port, &key, seed, tls_cert, tls_key),
    }
}

fn issuer_from_key(config: &Config, key: &std::path::Path) -> CapabilityTokenIssuer {
    match keyfiles::read_secret_key(key) {
        Ok(signing_key) => CapabilityTokenIssuer::new(signing_key, config.link_config()),
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn cmd_keygen(output: &str) {
    match keyfiles::write_keypair(output) {
        Ok(_) => println!("Generated Ed25519 keypair: {output}.secret, {output}.pub"),
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn parse_role(raw: &str) -> Role {
    match serde_json::from_value(serde_json::Value::String(raw.to_string())) {
        Ok(role) => role,
        Err(_) => {
            eprintln!("error: unknown role '{raw}'");
            process::exit(1);
        }
    }
}

fn cmd_issue_link(
    config: &Config,
    key: &std::path::Path,
    convention_id: &str,
    role: &str,
    email: &str,
    route: &str,
    lifetime: LinkLifetime,
) {
    let issuer = issuer_from_key(config, key);
    let role = parse_role(role);
    let now = OffsetDateTime::now_utc();
    let token = issuer.issue_for_convention(convention_id, role, email, route, lifetime, now);
    println!("{}", issuer.link_url(route, &token));
}

fn cmd_verify_link(config: &Config, key: &std::path::Path, token: &str) {
    let issuer = issuer_from_key(config, key);
    let now = OffsetDateTime::now_utc();
    match issuer.verify(token, now) {
        Ok(payload) => {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
        Err(LinkError::Expired { expired_at }) => {
            eprintln!("token expired at {expired_at}");
            process::exit(2);
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn cmd_serve(
    config: &Config,
    port: Option<u16>,
    key: &std::path::Path,
    seed: Option<PathBuf>,
    tls_cert: Option<PathBuf>,
    tls_key: Option<PathBuf>,
) {
    let issuer = issuer_from_key(config, key);
    let port = port.unwrap_or(config.server.port);
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {e}");
            process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(serve::start_server(port, issuer, seed, tls_cert, tls_key)) {
        eprintln!("server error: {e}");
        process::exit(1);
    }
}
