//! cep-weather
//!
//! Looks up the current temperature for a Brazilian zip code (CEP).
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌─────────────┐  traceparent  ┌──────────────┐
//!   POST /weather  │   gateway   │──────────────▶│  aggregator  │──▶ ViaCEP
//!  ───────────────▶│  validate + │  POST /weather│  validate +  │
//!  ◀───────────────│   forward   │◀──────────────│  resolve +   │──▶ WeatherAPI
//!                  └──────┬──────┘               │   convert    │
//!                         │                      └──────┬───────┘
//!                         │     Zipkin v2 spans         │
//!                         └──────────────┬──────────────┘
//!                                        ▼
//!                                     Zipkin
//! ```
//!
//! One binary runs either role, chosen by subcommand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cep_weather::config::{load_config, ServiceRole};
use cep_weather::lifecycle::startup;
use cep_weather::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "cep-weather", version, about = "Zip code to weather services")]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, global = true, env = "CEP_WEATHER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Public entry point (service A).
    Gateway,
    /// Address and weather lookup (service B).
    Aggregator,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let role = match cli.command {
        Command::Gateway => ServiceRole::Gateway,
        Command::Aggregator => ServiceRole::Aggregator,
    };

    let config = load_config(role, cli.config.as_deref())?;
    init_logging(&config.observability)?;

    startup::run(role, config).await?;
    Ok(())
}
