//! lvote: command-line client for token-weighted voting sessions.

mod shell;

use anyhow::Context;
use clap::Parser;
use lvote_gateway::GatewayKind;
use lvote_session::{ClientConfig, ClientError, VotingClient};
use lvote_utils::LogFormat;
use std::path::PathBuf;

use crate::shell::{execute, render_view, ShellCommand};

#[derive(Parser)]
#[command(name = "lvote", about = "Token-weighted voting client", version)]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ledger backend: "rest" or "contract".
    #[arg(long, env = "LVOTE_GATEWAY")]
    gateway: Option<GatewayKind>,

    /// REST base URL, or JSON-RPC node URL for the contract backend.
    #[arg(long, env = "LVOTE_ENDPOINT")]
    endpoint: Option<String>,

    /// Voting contract address (contract backend).
    #[arg(long, env = "LVOTE_CONTRACT")]
    contract: Option<String>,

    /// ABI description with `methodIdentifiers` (contract backend).
    #[arg(long, env = "LVOTE_ABI")]
    abi: Option<PathBuf>,

    /// Account whose balance is shown and which sends transactions.
    #[arg(long, env = "LVOTE_ACCOUNT")]
    account: Option<String>,

    /// List options even before a session has been opened.
    #[arg(long, env = "LVOTE_ALWAYS_SHOW_OPTIONS")]
    always_show_options: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "LVOTE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "LVOTE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show participants, options, balance and the session phase.
    Status,
    /// Register a participant.
    Register { address: String, name: String },
    /// Add a voting option.
    AddOption { name: String },
    /// Open a session, crediting every participant with BUDGET tokens.
    Open { budget: String },
    /// Close the running session and show its winner.
    Close,
    /// Vote WEIGHT tokens for the option named OPTION.
    Vote { option: String, weight: String },
    /// Show the ledger's last winner.
    Winner,
    /// Interactive shell keeping one session context alive.
    Shell,
}

/// File settings as the base, flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(kind) = cli.gateway {
        config.gateway = kind;
    }
    if let Some(endpoint) = &cli.endpoint {
        config.gateway_endpoint = endpoint.clone();
    }
    if let Some(contract) = &cli.contract {
        config.contract_address = Some(contract.clone());
    }
    if let Some(abi) = &cli.abi {
        config.abi_path = Some(abi.clone());
    }
    if let Some(account) = &cli.account {
        config.account = account.clone();
    }
    if cli.always_show_options {
        config.always_show_options = true;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    lvote_utils::init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    let client = VotingClient::connect(&config).context("failed to set up the ledger gateway")?;
    tracing::debug!(account = client.account(), gateway = ?config.gateway, "client ready");

    let command = match cli.command {
        Command::Shell => return shell::run(&client).await,
        Command::Winner => {
            println!("{}", client.read_last_winner().await?);
            return Ok(());
        }
        Command::Status => ShellCommand::Status,
        Command::Register { address, name } => ShellCommand::Register { address, name },
        Command::AddOption { name } => ShellCommand::AddOption(name),
        Command::Open { budget } => ShellCommand::Open(budget),
        Command::Close => ShellCommand::Close,
        Command::Vote { option, weight } => ShellCommand::Vote { option, weight },
    };

    client.load().await.context("failed to read the ledger")?;
    match execute(&client, command).await {
        Ok(Some(text)) => println!("{text}"),
        Ok(None) => println!("{}", render_view(&client.view())),
        Err(e @ ClientError::InvalidTransition { .. }) => {
            eprintln!("hint: backends that do not report their phase need `lvote shell`");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
