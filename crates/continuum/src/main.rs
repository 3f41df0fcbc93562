//! Continuum CLI binary.
//!
//! - Compute continuity maps for segment files
//! - Compress prompts and check n-gram similarity
//! - Run the batch orchestrator against canned backend replies

use clap::Parser;
use continuum::{TelemetryOptions, init_telemetry, shutdown_telemetry};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, compress, continuity, generate, load_config, similarity};

    // Ignore a missing .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_telemetry(&TelemetryOptions {
        default_directive: if cli.verbose { "debug" } else { "warn" }.to_string(),
        format: cli.log_format,
        export_spans: cli.export_spans,
    })?;

    let config = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Continuity {
            segments,
            assets,
            story,
            persist,
        } => continuity(&config, &segments, assets.as_deref(), story.as_deref(), persist)?,
        Commands::Compress { prompt, target } => compress(&config, &prompt, target)?,
        Commands::Similarity { text, candidates } => similarity(&config, &text, &candidates)?,
        Commands::Generate {
            request,
            replay_dir,
        } => generate(config, &request, &replay_dir).await?,
    };

    println!("{output}");
    shutdown_telemetry();
    Ok(())
}
