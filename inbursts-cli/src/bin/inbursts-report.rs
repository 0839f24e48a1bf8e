use std::process::ExitCode;

use clap::Parser;

use inbursts_cli::cli::ReportCli;
use inbursts_cli::logging::init_tracing;
use inbursts_cli::report;
use inbursts_core::config::GeneralConfig;

fn main() -> ExitCode {
    let cli = ReportCli::parse();

    let logging = GeneralConfig {
        log_level: cli.log_level.clone(),
        ..GeneralConfig::default()
    };
    if let Err(e) = init_tracing(&logging) {
        eprintln!("{e:#}");
        return ExitCode::from(2);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match report::execute(&cli, &mut handle) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
