//! carprice CLI - Main entry point.

use carprice::cli::{Cli, Commands};
use carprice::compute::{ModelArtifact, PredictionService};
use carprice::config::ServiceConfig;
use carprice::observability;
use carprice::types::CarOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    // Load or create configuration
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };

    // Override with CLI args
    if let Some(artifact) = cli.artifact {
        config.model.artifact_path = artifact;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    match cli.command {
        Commands::Serve {
            bind_addr,
            json_logs,
            no_metrics,
        } => {
            if let Some(addr) = bind_addr {
                config.server.bind_addr = addr.parse()?;
            }
            config.observability.json_logs |= json_logs;
            config.observability.metrics_enabled &= !no_metrics;

            observability::init(&config.observability)?;
            carprice::run(config).await?;
        }

        Commands::Predict { input } => {
            observability::init(&config.observability)?;

            let body = std::fs::read_to_string(&input)?;
            let options: CarOptions = serde_json::from_str(&body)?;

            let service = PredictionService::new(config.model.artifact_path);
            let response = service.predict(options).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Inspect { convert } => {
            let artifact = ModelArtifact::load(&config.model.artifact_path)?;
            println!("{}", serde_json::to_string_pretty(&artifact.summary())?);

            if let Some(target) = convert {
                artifact.save(&target)?;
                eprintln!("Wrote {}", target.display());
            }
        }
    }

    Ok(())
}
