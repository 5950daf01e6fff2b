//! mediaflow CLI entry point.

use anyhow::Result;
use clap::Parser;
use mediaflow::cli::{commands, Cli, Commands};
use mediaflow::config::Settings;
use mediaflow::manager::ToolsetManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().map(Settings::expand_path);

    // Config commands must work even when the file on disk is broken
    if let Commands::Config { action } = &cli.command {
        init_logging(cli.verbose, None);
        let settings = Settings::load_from(config_path.as_ref()).unwrap_or_default();
        return commands::run_config(action, &settings, config_path);
    }

    let settings = Settings::load_from(config_path.as_ref())?;
    init_logging(cli.verbose, Some(&settings.general.log_level));

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Tools { json } => {
            let manager = ToolsetManager::with_defaults(&settings)?;
            commands::run_tools(&manager, *json)?;
        }

        Commands::Run {
            tool,
            params,
            dry_run,
            quality,
        } => {
            let manager = ToolsetManager::with_defaults(&settings)?;
            commands::run_tool(&manager, tool, params, *dry_run, quality.as_deref()).await?;
        }

        Commands::Workflow {
            name,
            params,
            dry_run,
            quality,
        } => {
            let manager = ToolsetManager::with_defaults(&settings)?;
            commands::run_workflow(&manager, name, params, *dry_run, quality.as_deref()).await?;
        }

        Commands::Clips {
            transcript,
            output,
            min_duration,
            max_duration,
            max_clips,
            min_score,
        } => {
            commands::run_clips(
                transcript,
                output.as_deref(),
                *min_duration,
                *max_duration,
                *max_clips,
                *min_score,
                &settings,
            )?;
        }

        Commands::Health => {
            let manager = ToolsetManager::with_defaults(&settings)?;
            commands::run_health(&manager)?;
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `-v` flags, then the configured level.
fn init_logging(verbose: u8, configured: Option<&str>) {
    let level = match verbose {
        0 => configured.unwrap_or("warn").to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("mediaflow={}", level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
