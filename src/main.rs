//! CLI entry point for cbcm: a Chrome Browser Cloud Management client.
//!
//! Parses flags, validates local inputs, authenticates once as the
//! service account impersonating `--admin`, then dispatches the
//! subcommand.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (delegation not granted, API error, partial move)
//! - 2: credentials file missing, or argument error reported by clap
//! - 3: credentials file invalid
//! - 64: other usage error
//! - 66: ID file unreadable

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cbcm::auth::{SCOPES, ServiceAccountKey, TokenProvider};
use cbcm::cli::Cli;
use cbcm::client::CbcmClient;
use cbcm::commands::{Context, execute, preflight};
use cbcm::error::{CbcmError, Result};

/// `--debug` raises our own and reqwest's events to debug; `RUST_LOG`
/// overrides both.
fn init_logging(debug: bool) {
    let default = if debug {
        "warn,cbcm=debug,reqwest=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    preflight(&cli.command)?;

    let key = ServiceAccountKey::load(&cli.credentials_file)?;
    tracing::debug!(
        client_id = %key.client_id,
        client_email = %key.client_email,
        "loaded service account"
    );
    let token = TokenProvider::new(key, &cli.admin, SCOPES)?
        .fetch_token()
        .await?;

    let client = CbcmClient::new(&cli.customer, &token.access_token)?;
    let ctx = Context::new(client);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&ctx, &cli.command, &mut out).await
}

fn report(err: &CbcmError) {
    eprintln!("ERROR: {err}");
    if let Some(remediation) = err.remediation() {
        eprintln!("{remediation}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            // Exit codes are all below 256.
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}
