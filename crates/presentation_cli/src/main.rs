//! TRIAS CLI
//!
//! Command-line interface for searching locations and departures on a
//! TRIAS endpoint, and for decoding saved TRIAS responses offline.

#![allow(clippy::print_stdout)]

mod commands;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{Output, ResponseKind};
use integration_trias::{
    HttpTriasClient, LocationInformationRequest, LocationType, StopEventRequest, TriasClient,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// TRIAS CLI
#[derive(Parser)]
#[command(name = "trias-cli")]
#[command(author, version, about = "TRIAS public transit client", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (defaults to ./trias.toml if present)
    #[arg(short, long, env = "TRIAS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Location type filter accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TypeArg {
    Stop,
    Address,
    Poi,
    Locality,
}

impl From<TypeArg> for LocationType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Stop => Self::Stop,
            TypeArg::Address => Self::Address,
            TypeArg::Poi => Self::Poi,
            TypeArg::Locality => Self::Locality,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search locations by name
    ///
    /// Example: trias-cli locations "Bismarckplatz" --type stop
    Locations {
        /// Name to search for
        name: String,

        /// Restrict results to one location type
        #[arg(short = 't', long = "type", value_enum)]
        location_type: Option<TypeArg>,

        /// Maximum number of results (default from config)
        #[arg(short, long)]
        limit: Option<u8>,
    },

    /// Find stops around a coordinate
    Nearby {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Search radius in meters
        #[arg(short, long, default_value = "500")]
        radius: u32,

        /// Maximum number of results (default from config)
        #[arg(short, long)]
        limit: Option<u8>,
    },

    /// List upcoming departures at a stop point
    ///
    /// Example: trias-cli departures de:08221:1160
    Departures {
        /// Stop point reference
        stop_ref: String,

        /// Maximum number of results (default from config)
        #[arg(short, long)]
        limit: Option<u8>,

        /// Skip realtime estimates
        #[arg(long)]
        no_realtime: bool,
    },

    /// Decode a saved TRIAS response file
    Decode {
        /// Path to the XML response
        file: PathBuf,

        /// Kind of response stored in the file
        #[arg(short, long, value_enum, default_value = "locations")]
        kind: ResponseKind,
    },

    /// Check whether the TRIAS endpoint answers
    Health,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = if cli.json { Output::Json } else { Output::Text };

    // offline decoding needs no endpoint configuration
    if let Commands::Decode { file, kind } = &cli.command {
        let body = tokio::fs::read(file).await?;
        println!("{}", commands::decode_body(&body, *kind, output)?);
        return Ok(());
    }

    let config = settings::load(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");
    let client = HttpTriasClient::new(&config)?;

    match cli.command {
        Commands::Locations {
            name,
            location_type,
            limit,
        } => {
            let mut request = LocationInformationRequest::by_name(name)
                .with_max_results(limit.unwrap_or(config.max_results));
            if let Some(location_type) = location_type {
                request = request.with_type(location_type.into());
            }
            println!("{}", commands::locations(&client, &request, output).await?);
        },

        Commands::Nearby {
            latitude,
            longitude,
            radius,
            limit,
        } => {
            let request = LocationInformationRequest::by_coordinate(latitude, longitude)?
                .with_radius(radius)
                .with_max_results(limit.unwrap_or(config.max_results));
            println!("{}", commands::locations(&client, &request, output).await?);
        },

        Commands::Departures {
            stop_ref,
            limit,
            no_realtime,
        } => {
            let request = StopEventRequest::new(stop_ref)
                .with_max_results(limit.unwrap_or(config.max_results))
                .with_realtime(!no_realtime);
            println!("{}", commands::departures(&client, &request, output).await?);
        },

        Commands::Health => {
            if client.is_healthy().await {
                println!("✅ Healthy");
            } else {
                println!("❌ Unreachable: {}", config.base_url);
                std::process::exit(1);
            }
        },

        Commands::Decode { .. } => {},
    }

    Ok(())
}
