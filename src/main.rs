//! cvm - Rank résumés against job descriptions.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cvmatch::Result;
use cvmatch::app::AppContext;
use cvmatch::cli::output::{emit_robot, robot_error};
use cvmatch::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.robot {
                // Robot mode: structured error envelope on stdout
                if emit_robot(&robot_error(&e)).is_err() {
                    eprintln!("Error: {e}");
                }
            } else {
                let structured = e.to_structured();
                eprintln!("{} {e}", "Error:".red().bold());
                eprintln!("  {}", structured.suggestion.dimmed());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Init(args) => cvmatch::cli::commands::init::run_without_context(cli, args),
        Commands::Completions(args) => cvmatch::cli::commands::completions::run(args),
        command => {
            let ctx = AppContext::from_cli(cli)?;
            cvmatch::cli::commands::run(&ctx, command)
        }
    }
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,cvmatch=info",
        1 => "info,cvmatch=debug",
        2 => "debug,cvmatch=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
