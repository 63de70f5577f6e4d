//! # ussd-cli
//!
//! Command-line interface for the USSD menu engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ussd_core::Config;

mod commands;

/// USSD menu engine - simulate and exercise menu sessions
#[derive(Parser)]
#[command(name = "ussd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./ussd.toml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session against the configured menu
    Simulate {
        /// Service code reported to handlers
        #[arg(long, default_value = "*384#")]
        service_code: String,
        /// Phone number reported to handlers
        #[arg(long, default_value = "254700000000")]
        phone: String,
    },
    /// Send one request and print the encoded response
    Request {
        /// Session ID
        #[arg(short, long)]
        session: String,
        /// Raw input, `*`-chained in chained mode
        #[arg(short, long, default_value = "")]
        input: String,
        /// Phone number
        #[arg(long, default_value = "254700000000")]
        phone: String,
        /// Service code
        #[arg(long, default_value = "*384#")]
        service_code: String,
    },
    /// Check configuration, menu document and handler bindings
    Validate,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.as_deref();
    match config_path {
        Some(path) if !path.exists() => {
            tracing::warn!("Config file {:?} not found, using defaults", path);
        }
        Some(path) => tracing::debug!("Using config file {:?}", path),
        None => tracing::debug!("No config file given, looking for ./ussd.toml"),
    }

    match cli.command {
        Commands::Simulate {
            service_code,
            phone,
        } => {
            let config = Config::load_validated(config_path)?;
            commands::simulate::run(config, &service_code, &phone).await?;
        }
        Commands::Request {
            session,
            input,
            phone,
            service_code,
        } => {
            let config = Config::load_validated(config_path)?;
            commands::request::run(config, &session, &input, &phone, &service_code).await?;
        }
        Commands::Validate => {
            commands::validate::run(config_path)?;
        }
        Commands::Config => {
            let config = Config::load_validated(config_path)?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
