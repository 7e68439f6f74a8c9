use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use swapi_sync::config::SyncConfig;
use swapi_sync::swapi::SwapiClient;
use swapi_sync::util::env as env_util;
use swapi_sync::{pipeline, ErrorKind, SyncError};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "swapi_sync", version, about = "Copy SWAPI people and planets into SQL tables")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, normalize and append both collections (default when no command supplied)
    Run,
    /// List the collections the API root advertises
    Collections,
    /// Print the item count a collection reports
    Count { collection: String },
    /// Print the HTTP status of a URL (-1 when the connection fails)
    Status { url: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_util::init_env();
    swapi_sync::tracing::init_tracing("info")?;

    let cli = Cli::parse();
    env_util::preflight_check("swapi_sync", &[], SyncConfig::LOGGED_KEYS)?;
    let cfg = SyncConfig::from_env().context("building configuration")?;

    let outcome = match cli.command.unwrap_or(Command::Run) {
        Command::Run => pipeline::run_from_config(&cfg).await.map(|summary| {
            for (table, rows) in &summary.loaded {
                info!(table = %table, rows, "table loaded");
            }
        }),
        Command::Collections => list_collections(&cfg).await,
        Command::Count { collection } => print_count(&cfg, &collection).await,
        Command::Status { url } => print_status(&cfg, &url).await,
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            report(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Single place where a failed run is turned into a log line.
fn report(e: &SyncError) {
    let kind = e.kind();
    match kind {
        ErrorKind::Database => {
            error!(kind = kind.label(), error = %e, "something went wrong with the database")
        }
        k if k.is_fetch_class() => {
            error!(kind = kind.label(), error = %e, "sync aborted: fetching from the API failed")
        }
        ErrorKind::Normalize => {
            error!(kind = kind.label(), error = %e, "sync aborted: unexpected field value")
        }
        _ => error!(kind = kind.label(), error = %e, "sync aborted: bad configuration"),
    }
}

async fn list_collections(cfg: &SyncConfig) -> Result<(), SyncError> {
    let client = SwapiClient::new(&cfg.base_url, cfg.http_timeout)?;
    let index = client.collection_index().await?;
    println!("Dictionary Contains:");
    for name in index.names() {
        println!("{name}");
    }
    Ok(())
}

async fn print_count(cfg: &SyncConfig, collection: &str) -> Result<(), SyncError> {
    let client = SwapiClient::new(&cfg.base_url, cfg.http_timeout)?;
    let index = client.collection_index().await?;
    let count = client.collection_count(&index, collection).await?;
    println!("{collection}: {count}");
    Ok(())
}

async fn print_status(cfg: &SyncConfig, url: &str) -> Result<(), SyncError> {
    let client = SwapiClient::new(&cfg.base_url, cfg.http_timeout)?;
    println!("Status: {}", client.url_status(url).await);
    Ok(())
}
