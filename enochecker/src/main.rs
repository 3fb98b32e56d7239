use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use enochecker_core::api::CheckerServer;
use enochecker_core::client::CheckerClient;
use enochecker_core::config::{EnoConfig, LoggingConfig};
use enochecker_core::error::EnoResult;
use enochecker_core::observability::init_tracing;
use enochecker_core::registry::CheckerRegistry;
use enochecker_core::types::{TaskDescription, TaskMethod};

#[derive(Parser)]
#[command(name = "enochecker")]
#[command(about = "Checker service and task client for attack/defense CTFs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the HTTP checker service
    Serve {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address for the HTTP server (e.g., 0.0.0.0:8000)
        #[arg(long)]
        bind: Option<String>,

        /// Checker to run (see `enochecker checkers`)
        #[arg(long)]
        checker: Option<String>,

        /// Port of the team service under test
        #[arg(long)]
        service_port: Option<u16>,
    },
    /// List available checkers
    Checkers,
    /// Query a running checker's service description
    Info {
        /// Base URL of the checker service
        #[arg(long)]
        url: String,
    },
    /// Submit a single task to a running checker
    Task {
        /// Base URL of the checker service
        #[arg(long)]
        url: String,

        /// putflag, getflag, putnoise, getnoise or havoc
        #[arg(long)]
        method: TaskMethod,

        /// Address of the team service
        #[arg(long)]
        address: String,

        /// Flag for putflag/getflag
        #[arg(long)]
        flag: Option<String>,

        #[arg(long, default_value = "1")]
        task_id: u64,

        #[arg(long, default_value = "1")]
        team_id: u64,

        #[arg(long, default_value = "team1")]
        team_name: String,

        /// Defaults to `checker.service_id` from the environment configuration
        #[arg(long)]
        service_id: Option<u64>,

        #[arg(long, default_value = "1")]
        current_round: u64,

        /// Round of the put task this get task checks; defaults to the current round
        #[arg(long)]
        related_round: Option<u64>,

        #[arg(long, default_value = "0")]
        variant_id: u64,

        /// Task timeout (e.g., 10s, 1500ms)
        #[arg(long, default_value = "10s", value_parser = parse_duration)]
        timeout: Duration,

        #[arg(long, default_value = "60s", value_parser = parse_duration)]
        round_length: Duration,
    },
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> EnoResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind, checker, service_port } => {
            let mut config = match config {
                Some(path) => EnoConfig::load(&path)?,
                None => EnoConfig::from_env()?,
            };

            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            if let Some(checker) = checker {
                config.checker.name = checker;
            }
            if let Some(port) = service_port {
                config.checker.service_port = port;
            }
            config.validate()?;

            init_tracing(&config.logging)?;

            let registry = CheckerRegistry::with_builtins();
            let server = CheckerServer::from_config(config, &registry)?;
            server.serve(shutdown_signal()).await?;
        }
        Commands::Checkers => {
            for name in CheckerRegistry::with_builtins().names() {
                println!("{}", name);
            }
        }
        Commands::Info { url } => {
            let config = EnoConfig::from_env()?;
            init_cli_tracing()?;

            let client = CheckerClient::new(url, &config.client)?;
            let info = client.service_info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Task {
            url,
            method,
            address,
            flag,
            task_id,
            team_id,
            team_name,
            service_id,
            current_round,
            related_round,
            variant_id,
            timeout,
            round_length,
        } => {
            let config = EnoConfig::from_env()?;
            init_cli_tracing()?;

            let mut builder = TaskDescription::builder(method, address)
                .task_id(task_id)
                .team(team_id, team_name)
                .service_id(effective_service_id(service_id, &config))
                .rounds(current_round, related_round.unwrap_or(current_round))
                .variant_id(variant_id)
                .timeout(timeout)
                .round_length(round_length);
            if let Some(flag) = flag {
                builder = builder.flag(flag);
            }
            let task = builder.build()?;

            let client = CheckerClient::new(url, &config.client)?;
            let result = client.submit(&task).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn effective_service_id(flag: Option<u64>, config: &EnoConfig) -> u64 {
    flag.unwrap_or(config.checker.service_id)
}

/// Client commands only log warnings so their stdout stays machine-readable
fn init_cli_tracing() -> EnoResult<()> {
    init_tracing(&LoggingConfig {
        level: "warn".to_string(),
        ..LoggingConfig::default()
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        // Without a signal handler, keep serving until killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
