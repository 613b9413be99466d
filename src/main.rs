//! CLI entry point for bb-vault.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod cli;
mod commands;
mod config;
mod progress;

use cli::{Cli, Command};
use commands::{
    CoursesArgs, CrawlArgs, run_courses_command, run_crawl_command, run_login_command,
    run_logout_command,
};
use config::{LoadedConfig, Settings, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_deref())?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level(&cli, &loaded)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?cli, "CLI arguments parsed");
    if let Some(path) = &loaded.path {
        debug!(path = %path.display(), "Loaded config file");
    }

    let settings = Settings::resolve(loaded.config.as_ref())?;
    let username = cli.username.clone();

    match cli.command {
        Command::Login => run_login_command(&settings, username).await,
        Command::Logout => run_logout_command(&settings, username),
        Command::Courses {
            terms,
            announcements,
            json,
        } => {
            let args = CoursesArgs {
                terms,
                announcements,
                json,
            };
            run_courses_command(&settings, username, &args).await
        }
        Command::Crawl {
            terms,
            output,
            concurrency,
            per_course,
            clean,
        } => {
            let args = CrawlArgs {
                terms,
                output,
                concurrency,
                per_course,
                clean,
            };
            let use_spinner = !cli.quiet && io::stderr().is_terminal();
            run_crawl_command(&settings, username, &args, use_spinner, shutdown_token()).await
        }
    }
}

fn default_level(cli: &Cli, loaded: &LoadedConfig) -> &'static str {
    if cli.quiet {
        return "error";
    }
    match cli.verbose {
        0 => loaded
            .config
            .as_ref()
            .and_then(|c| c.verbosity)
            .map_or("info", config::VerbositySetting::filter),
        1 => "debug",
        _ => "trace",
    }
}

/// Token cancelled on the first Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping after in-flight downloads");
                trigger.cancel();
            }
            Err(error) => warn!(%error, "Cannot listen for Ctrl-C"),
        }
    });
    token
}
