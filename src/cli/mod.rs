//! Command-line interface for carprice.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// carprice - daily rental price estimation for cars.
#[derive(Parser)]
#[command(name = "carprice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CARPRICE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CARPRICE_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Model artifact (overrides the configuration file)
    #[arg(short, long, env = "CARPRICE_ARTIFACT", global = true)]
    pub artifact: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction API
    Serve {
        /// Bind address
        #[arg(long, env = "CARPRICE_BIND_ADDR")]
        bind_addr: Option<String>,

        /// Emit JSON logs
        #[arg(long)]
        json_logs: bool,

        /// Disable the /metrics endpoint
        #[arg(long)]
        no_metrics: bool,
    },

    /// Price the car options of a request file without starting a server
    Predict {
        /// JSON file shaped like the /predict request body
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show what a model artifact contains
    Inspect {
        /// Write the artifact again to this path (format from extension)
        #[arg(long)]
        convert: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from([
            "carprice",
            "--artifact",
            "model.bin",
            "serve",
            "--bind-addr",
            "127.0.0.1:4000",
            "--no-metrics",
        ])
        .unwrap();

        assert_eq!(cli.artifact, Some(PathBuf::from("model.bin")));
        match cli.command {
            Commands::Serve { bind_addr, no_metrics, json_logs } => {
                assert_eq!(bind_addr.as_deref(), Some("127.0.0.1:4000"));
                assert!(no_metrics);
                assert!(!json_logs);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_predict_requires_input() {
        assert!(Cli::try_parse_from(["carprice", "predict"]).is_err());
        let cli = Cli::try_parse_from(["carprice", "predict", "-i", "cars.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Predict { .. }));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
