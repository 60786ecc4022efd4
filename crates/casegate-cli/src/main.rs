use anyhow::Result;
use casegate_core::routing::Portal;
use casegate_infrastructure::ConfigService;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

use commands::guard::{GuardKindArg, PrincipalArg};

#[derive(Parser)]
#[command(name = "casegate")]
#[command(about = "Casegate CLI - portal access gating for case management", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/casegate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the decision a route guard makes for a principal
    Guard {
        /// Portal the guard protects (client or internal)
        #[arg(long)]
        portal: Portal,
        #[arg(long, value_enum, default_value = "protected")]
        kind: GuardKindArg,
        #[arg(long, value_enum)]
        principal: PrincipalArg,
    },
    /// Sign in against the hosted backend and print the resolved access state
    Access {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CASEGATE_PASSWORD")]
        password: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let config = config_service.get_config()?;
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config)?,
            ConfigAction::Path => commands::config::path(&config_service),
        },
        Commands::Guard {
            portal,
            kind,
            principal,
        } => commands::guard::run(&config, portal, kind, principal)?,
        Commands::Access { email, password } => {
            commands::access::run(&config, &email, &password).await?
        }
    }

    Ok(())
}
