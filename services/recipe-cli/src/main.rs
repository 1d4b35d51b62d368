//! Recipe command-line client
//!
//! Single binary that:
//! 1. Loads configuration (file, env, flags)
//! 2. Opens the configured credential store
//! 3. Runs one command through the authenticated client
//! 4. Prints the result as pretty JSON on stdout

mod commands;
mod config;

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use auth_client::{AuthenticatedClient, ErrorKind};
use credential_store::CredentialStore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Command;
use crate::config::{Config, Overrides};

const USAGE: &str = "\
usage: recipe [--config <path>] [--base-url <url>] [--storage <keyring|file|memory>] <command>

commands:
  login [<token> | -]     exchange the login redirect credential for a session
                          (reads it from stdin when omitted or `-`)
  logout                  forget stored credentials
  status                  show session and configuration
  get <path> [k=v ...]    GET an API path and print the JSON body
  search [text] [opts]    search recipes (--vegetarian --vegan --gluten-free
                          --dairy-free --healthy --cheap --difficulty <d>
                          --cuisine <c> --diet <d> --order <field> --limit <n> --page <n>)
  filters                 available search filter values
  profile                 account profile and recipe lists
  notifications           notification inbox
  orders                  order history";

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
struct Cli {
    config: Option<String>,
    overrides: Overrides,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Cli> {
    let mut config = None;
    let mut overrides = Overrides::default();
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(iter.next().context("--config needs a path")?.clone());
            }
            "--base-url" => {
                overrides.base_url = Some(iter.next().context("--base-url needs a URL")?.clone());
            }
            "--storage" => {
                let kind = iter.next().context("--storage needs a backend name")?;
                overrides.storage = Some(kind.parse()?);
            }
            "-h" | "--help" => bail!("{USAGE}"),
            _ => rest.push(arg.clone()),
        }
    }

    let command = Command::parse(&rest)?;
    Ok(Cli {
        config,
        overrides,
        command,
    })
}

/// Tracing to stderr, JSON when LOG_FORMAT=json, filter from LOG_LEVEL / RUST_LOG.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(args: &[String]) -> Result<()> {
    let cli = parse_args(args)?;

    let (config_path, required) = Config::resolve_path(cli.config.as_deref());
    debug!(path = %config_path.display(), required, "loading configuration");
    let config = Config::load(&config_path, required, &cli.overrides)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let backend = config.backend_config()?;
    let store = CredentialStore::open(&backend)
        .await
        .context("failed to open credential store")?;

    let client = AuthenticatedClient::new(&config.client_options(), store)
        .context("failed to build HTTP client")?;
    info!(
        base_url = %config.api.base_url,
        store = client.store().backend_id(),
        "client ready"
    );

    let output = commands::execute(&client, &config, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print a failure the way a user needs to see it.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<auth_client::Error>() {
        Some(api) if api.kind() == ErrorKind::Authentication => {
            eprintln!("{api}");
            eprintln!("session expired, run `recipe login` to sign in again");
        }
        Some(auth_client::Error::Http(http)) => {
            eprintln!("error: {http}");
            let body = http.body_text();
            if !body.is_empty() {
                eprintln!("{body}");
            }
        }
        Some(api) if api.kind() == ErrorKind::Network => {
            eprintln!("error: {api}");
            eprintln!("check your connection and try again");
        }
        _ => eprintln!("error: {err:#}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
