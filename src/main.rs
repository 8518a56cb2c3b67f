use clap::Parser;
use mb_forecast::cli::{Cli, Commands};
use mb_forecast::config::Config;
use mb_forecast::forecast::ArtifactStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    mb_forecast::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Catalog(args) => {
            tracing::info!("Refreshing item catalog");
            args.execute(&config).await?;
        }
        Commands::Capture(args) => {
            tracing::info!("Starting sale capture");
            args.execute(&config).await?;
        }
        Commands::Train(args) => {
            tracing::info!("Starting training run");
            args.execute(&config).await?;
        }
        Commands::Predict(args) => {
            args.execute(&config).await?;
        }
        Commands::Serve(args) => {
            tracing::info!("Starting dashboard");
            args.execute(&config).await?;
        }
        Commands::Status => {
            let store = ArtifactStore::new(&config.artifacts.dir);
            println!("mb-forecast status");
            println!("  Strategy: {:?}", config.forecast.strategy);
            println!("  Artifacts: {}", config.artifacts.dir.display());
            match store.sequence_age() {
                Some(age) => println!("  Sequence model: saved {}s ago", age.as_secs()),
                None => println!("  Sequence model: not trained"),
            }
            match store.tabular_age() {
                Some(age) => println!("  Tabular pipeline: saved {}s ago", age.as_secs()),
                None => println!("  Tabular pipeline: not trained"),
            }
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Catalog: {}", config.catalog.base_url);
            println!("  Market: {}", config.market.base_url);
            println!(
                "  Forecast: {:?} window={} epochs={}",
                config.forecast.strategy, config.forecast.window_size, config.forecast.epochs
            );
            println!("  Dashboard: {}", config.dashboard.bind_address);
        }
    }

    Ok(())
}
