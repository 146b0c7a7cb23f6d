// # sysdig-tf - Sysdig Monitor team driver
//
// Command-line front end for the monitor team resource. It is a thin
// integration layer: it reads configuration, registers the HTTP clients,
// opens the record store and hands each subcommand to `sysdig-core`.
//
// ## Configuration
//
// Credentials come from environment variables only (see `config.rs`).
// Logging goes to stderr; command output goes to stdout.
//
// - `SYSDIG_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export SYSDIG_MONITOR_API_TOKEN=your_token
// export SYSDIG_STATE_PATH=/var/lib/sysdig-tf/state.json
//
// sysdig-tf apply ops --config ops.json
// sysdig-tf refresh ops
// sysdig-tf destroy ops
// sysdig-tf owners resource_sysdig_monitor_team.go
// ```

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use sysdig_codeowner::OwnerLoader;
use sysdig_core::config::ProviderConfig;
use sysdig_core::{ClientRegistry, MonitorTeamResource, StateRecord, state};
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum TfExitCode {
    /// Command completed
    Success = 0,
    /// Configuration, declaration or startup error
    ConfigError = 1,
    /// The remote operation or lookup failed
    OperationFailed = 2,
}

impl From<TfExitCode> for ExitCode {
    fn from(code: TfExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(name = "sysdig-tf")]
#[command(about = "Manage Sysdig Monitor teams", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SYSDIG_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a team from a JSON declaration
    Apply {
        /// Name the team is tracked under
        name: String,

        /// Declaration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Re-read a managed team from the API
    Refresh {
        /// Name the team is tracked under
        name: String,
    },
    /// Delete a managed team
    Destroy {
        /// Name the team is tracked under
        name: String,
    },
    /// Start managing an existing team
    Import {
        /// Name to track the team under
        name: String,

        /// Numeric team ID
        id: String,
    },
    /// List managed teams
    List,
    /// Print who to report to for a resource file
    Owners {
        /// Resource file; only its base name is matched
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = Level::from_str(&cli.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return TfExitCode::ConfigError.into();
    }

    // CODEOWNERS lookups need no credentials
    if let Commands::Owners { path } = &cli.command {
        return match print_owners(path) {
            Ok(()) => TfExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                exit_code(&e)
            }
        }
        .into();
    }

    let provider = match Config::from_env().and_then(|c| {
        debug!(config = ?c, "configuration loaded");
        c.provider_config()
    }) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return TfExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return TfExitCode::OperationFailed.into();
        }
    };

    let result = rt.block_on(async {
        match run(provider, cli.command).await {
            Ok(()) => TfExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                exit_code(&e)
            }
        }
    });

    result.into()
}

/// Run one resource subcommand
async fn run(provider: ProviderConfig, command: Commands) -> Result<()> {
    let registry = ClientRegistry::new();
    sysdig_client_http::register(&registry);

    let resource = MonitorTeamResource::new(&provider, Arc::new(registry));
    let store = state::from_config(&provider.state_store).await?;
    debug!(client = %resource.client_type(), "resource ready");

    match command {
        Commands::Apply { name, config } => {
            let content = tokio::fs::read_to_string(&config).await.map_err(|e| {
                sysdig_core::Error::config(format!("cannot read {}: {}", config.display(), e))
            })?;
            let declared = serde_json::from_str(&content).map_err(|e| {
                sysdig_core::Error::validation(format!("{}: {}", config.display(), e))
            })?;

            let record = commands::apply(&resource, store.as_ref(), &name, &declared).await?;
            print_record(&record)?;
        }
        Commands::Refresh { name } => {
            let record = commands::refresh(&resource, store.as_ref(), &name).await?;
            print_record(&record)?;
        }
        Commands::Destroy { name } => {
            commands::destroy(&resource, store.as_ref(), &name).await?;
        }
        Commands::Import { name, id } => {
            let record = commands::import(&resource, store.as_ref(), &name, &id).await?;
            print_record(&record)?;
        }
        Commands::List => {
            for (name, record) in commands::list(store.as_ref()).await? {
                println!("{}\t{}\t{}", name, record.id, record.last_refreshed);
            }
        }
        Commands::Owners { path } => print_owners(&path)?,
    }

    store.flush().await?;
    Ok(())
}

fn print_owners(path: &Path) -> Result<()> {
    let loader = OwnerLoader::from_current_dir()?;
    let mentions = loader.load_owners(path)?;
    println!("{}", mentions.join(" "));
    Ok(())
}

fn print_record(record: &StateRecord) -> Result<()> {
    let output = serde_json::to_string_pretty(record).context("failed to render record")?;
    println!("{}", output);
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> TfExitCode {
    match err.downcast_ref::<sysdig_core::Error>() {
        Some(
            sysdig_core::Error::Validation(_)
            | sysdig_core::Error::Config(_)
            | sysdig_core::Error::RecordWrite { .. },
        ) => TfExitCode::ConfigError,
        _ => TfExitCode::OperationFailed,
    }
}
