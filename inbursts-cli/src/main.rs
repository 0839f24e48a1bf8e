use std::process::ExitCode;

use clap::Parser;

use inbursts_cli::capture;
use inbursts_cli::cli::{CaptureCli, USAGE};
use inbursts_cli::error::CliError;
use inbursts_cli::logging::init_tracing;
use inbursts_core::config::InburstsConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CaptureCli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: CaptureCli) -> Result<(), CliError> {
    if cli.help {
        return Err(CliError::Usage(USAGE.trim_end().to_owned()));
    }

    // Priority: CLI flags > environment > config file > defaults
    let mut config = InburstsConfig::resolve(cli.config.as_deref()).await?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    init_tracing(&config.general)?;
    inbursts_core::metrics::describe_all();

    let summary = capture::run(&config).await?;

    eprintln!("\n{summary}");
    eprintln!("Exiting");
    Ok(())
}
