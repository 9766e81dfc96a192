//! # newapp CLI
//!
//! Resolves images, templates and source code into build and deploy
//! artifacts.
//!
//! ## Startup sequence
//!
//! 1. Parse CLI arguments (clap handles `--help` / `--version` early-exit).
//! 2. Initialise the tracing subscriber (logging).
//! 3. Load configuration (file + env + defaults).
//! 4. Build the [`OutputManager`].
//! 5. Dispatch to the appropriate command handler.
//! 6. Translate any [`error::CliError`] into a user-facing message and exit code.
//!
//! ## Exit codes
//!
//! | Code | Meaning                 |
//! |------|-------------------------|
//! |  0   | Success                 |
//! |  1   | Internal / system error |
//! |  2   | User / input error      |
//! |  3   | Resource not found      |
//! |  4   | Configuration error     |

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};
use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    error::CliResult,
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

fn main() -> ExitCode {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let (cli, config, _log_guard) = match start() {
        Ok(started) => started,
        Err(code) => return code,
    };

    let output = OutputManager::new(&cli.global, &config);
    let verbose = cli.global.verbose > 0;
    let color = output.supports_color();

    match run(cli, config, output) {
        Ok(()) => {
            info!("newapp completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            e.log();
            eprint!("{}", e.render(verbose, color));
            ExitCode::from(e.exit_code())
        }
    }
}

/// Steps 1 to 3: arguments, logging, configuration. On failure the exit
/// code has already been decided and the message printed.
///
/// The returned guard flushes the log file on drop, so `main` holds it
/// until exit.
fn start() -> Result<(Cli, AppConfig, Option<WorkerGuard>), ExitCode> {
    let cli = Cli::try_parse().map_err(|e| {
        // --help and --version arrive here too and are not failures.
        if e.use_stderr() {
            eprintln!("{}", e.render().ansi());
            ExitCode::from(2)
        } else {
            let _ = e.print();
            ExitCode::SUCCESS
        }
    })?;

    let guard = init_logging(&cli.global).map_err(|e| {
        eprintln!("Failed to initialise logging: {e:#}");
        ExitCode::from(1)
    })?;
    debug!(
        verbose = cli.global.verbose,
        quiet = cli.global.quiet,
        no_color = cli.global.no_color,
        command = ?cli.command,
        "CLI started"
    );

    let config = AppConfig::load(cli.global.config.as_ref()).map_err(|e| {
        tracing::error!("Failed to load configuration: {e:#}");
        eprintln!("Error: failed to load configuration: {e:#}");
        ExitCode::from(4)
    })?;

    Ok((cli, config, guard))
}

/// Dispatch to the correct command handler.
#[instrument(skip_all)]
fn run(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let global = cli.global;
    match cli.command {
        Commands::Generate(cmd) => commands::generate::execute(cmd, global, config, output),
        Commands::Build(cmd) => commands::build::execute(cmd, global, config, output),
        Commands::Search(cmd) => commands::search::execute(cmd, global, config, output),
        Commands::Init(cmd) => commands::init::execute(cmd, global, config, output),
        Commands::Completions(cmd) => commands::completions::execute(cmd),
        Commands::Config(cmd) => commands::config::execute(cmd, global, config, output),
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
