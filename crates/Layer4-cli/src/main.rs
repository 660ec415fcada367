//! offload CLI - Main entry point
//!
//! Acts as the single-threaded host: every shell line becomes one boundary
//! call, while task bodies run on the boundary's own runtime.

mod cli;
mod shell;

use clap::{Parser, Subcommand};
use cli::OneShot;
use offload_foundation::OffloadConfig;
use offload_task::Boundary;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// offload - hand blocking work to a concurrent task manager
#[derive(Parser, Debug)]
#[command(name = "offload")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (defaults to global + project config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read commands from stdin, one per line (default)
    Shell,
    /// Run one code task, wait for it and print the result
    Exec {
        /// Inline code to run
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        code: Option<String>,

        /// Script file to run
        #[arg(long)]
        file: Option<String>,

        /// Wait bound in milliseconds
        #[arg(long)]
        timeout: Option<i64>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let config = match &args.config {
        Some(path) => OffloadConfig::load_from(path)?,
        None => OffloadConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            OffloadConfig::default()
        }),
    };
    debug!(
        "Interpreter: {}, default wait: {}ms",
        config.interpreter.program, config.default_wait_timeout_ms
    );

    let boundary = Boundary::new(config)?;
    boundary.init()?;

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            shell::run(&boundary, stdin.lock(), stdout.lock())?;
        }
        Command::Exec {
            code,
            file,
            timeout,
        } => {
            let job = match (code, file) {
                (Some(code), _) => OneShot::Code(code),
                (None, Some(file)) => OneShot::File(file),
                (None, None) => anyhow::bail!("either --code or --file is required"),
            };
            let exit_code = match cli::run_once(&boundary, &job, timeout) {
                Ok(output) => {
                    print!("{}", output);
                    0
                }
                Err(e) => {
                    debug!("One-shot task ended with error: {:?}", e);
                    eprintln!("{}", e);
                    cli::exit_code(&e)
                }
            };
            // process::exit skips stdout's buffer flush
            std::io::Write::flush(&mut std::io::stdout())?;
            boundary.shutdown();
            drop(boundary);
            std::process::exit(exit_code);
        }
    }

    boundary.shutdown();
    Ok(())
}
