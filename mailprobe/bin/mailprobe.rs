//! Command-line mailbox deliverability probe.
//!
//! Exit codes: 0 when the exchanger accepts the recipient, 1 when it
//! rejects it, 2 when no verdict could be obtained.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;

use mailprobe::{Config, Verifier, VerifyOptions};

/// Check whether a mailbox would accept mail, without sending any
#[derive(Parser, Debug)]
#[command(name = "mailprobe")]
#[command(about = "Check whether a mailbox would accept mail, without sending any", long_about = None)]
#[command(version)]
struct Cli {
    /// Email address to test
    email: String,

    /// Domain to identify as in the HELO command (default: local hostname)
    #[arg(long)]
    sender_domain: Option<String>,

    /// Address to identify as in the MAIL FROM command (default: test@<sender-domain>)
    #[arg(long)]
    sender_address: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Give up on greylisting servers instead of retrying once
    #[arg(long)]
    no_greylist_retry: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    mailprobe::logging::init();

    let cli = Cli::parse();
    let email = cli.email.clone();

    match run(cli).await {
        Ok(true) => {
            println!("{email}: accepted");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("{email}: rejected");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("mailprobe: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            toml::from_str::<Config>(&raw)
                .with_context(|| format!("could not parse {}", path.display()))?
        }
        None => Config::default(),
    };

    if cli.no_greylist_retry {
        config.verifier.greylist_retry = false;
    }

    let verifier = Verifier::new(config).context("could not initialise the DNS resolver")?;

    let options = VerifyOptions {
        sender_domain: cli.sender_domain,
        sender_address: cli.sender_address,
    };

    Ok(verifier.verify(&cli.email, &options).await?)
}
