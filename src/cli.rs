use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ServiceConfig;

#[derive(Parser)]
#[command(name = "petple")]
#[command(about = "Petple pet service backend", long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Path to the configuration file",
        default_value = "config/config.toml"
    )]
    pub config: PathBuf,
    #[arg(
        long,
        global = true,
        env = "PETPLE_ENV",
        help = "Optional profile. Layers <config stem>.<profile>.toml over the base file"
    )]
    pub profile: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server with the scheduled weather crawl and pet clinic sync
    Serve {
        #[arg(short = 'p', long, help = "Port to bind the API server to")]
        api_port: Option<u16>,
        #[arg(short, long, help = "Path to the database file")]
        database_path: Option<PathBuf>,
    },
    /// Fetch one window of the Seoul pet clinic feed and store it
    LoadPetClinics {
        #[arg(short, long, help = "First row to fetch (1-based)", default_value_t = 1)]
        start: u32,
        #[arg(short, long, help = "Last row to fetch (inclusive)", default_value_t = 5)]
        end: u32,
        #[arg(short, long, help = "Path to the database file")]
        database_path: Option<PathBuf>,
    },
    /// Scrape the current weather once and store it
    CrawlWeather {
        #[arg(short, long, help = "Location to search for. Defaults to the configured one")]
        location: Option<String>,
        #[arg(short, long, help = "Path to the database file")]
        database_path: Option<PathBuf>,
    },
}

impl Commands {
    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        let database_path = match self {
            Commands::Serve {
                api_port,
                database_path,
            } => {
                if let Some(port) = api_port {
                    config.api_port = *port;
                }
                database_path
            },
            Commands::LoadPetClinics { database_path, .. } | Commands::CrawlWeather { database_path, .. } => {
                database_path
            },
        };
        if let Some(path) = database_path {
            config.database_path = path.clone();
        }
    }
}
