use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vigil::{config::AppConfig, pipeline::Pipeline};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding app.yaml.
    #[arg(long, default_value = "configs")]
    config_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the alert ingestion and correlation service.
    Run,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            tracing::debug!("Loading application configuration...");
            let config = AppConfig::new(Some(&cli.config_dir))?;
            tracing::info!(
                listen_address = %config.server.listen_address,
                threshold = config.correlator.threshold,
                window = ?config.correlator.window_secs,
                "Configuration loaded."
            );

            let pipeline = Pipeline::from_config(config).await?;
            pipeline.run().await?;
        }
    }

    Ok(())
}
