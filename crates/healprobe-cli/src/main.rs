//! Healprobe CLI: locators and resilient resolution for DOM fixtures
//!
//! ## Usage
//!
//! ```bash
//! healprobe generate shadow > page.yaml              # Pathological fixture
//! healprobe locate page.yaml --key target            # Positioned locator
//! healprobe resolve page.yaml --id x -c shadow:host-1
//! healprobe run page.yaml --config run.yaml          # Scenarios + panel
//! ```

use clap::Parser;
use healprobe_cli::{handlers, init_logging, Cli, CliConfig, CliResult, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(&config);

    match &cli.command {
        Commands::Locate(args) => handlers::execute_locate(&config, args),
        Commands::Resolve(args) => handlers::execute_resolve(&config, args),
        Commands::Run(args) => handlers::execute_run(&config, args),
        Commands::Generate(args) => handlers::execute_generate(&config, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
        .with_log_json(cli.log_json)
}
