//! Forensia CLI - inspect the cached case resources from a terminal.
//!
//! Lists collections through the same controllers the apps use, and can watch
//! one resource while its background sync keeps it fresh.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use forensia_core::config::{API_URL_ENV, TOKEN_ENV};
use forensia_core::models::Record;
use forensia_core::{CollectionController, Config, ControllerSettings, Controllers, HttpClient};
use serde::Serialize;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How often `watch` checks the view for a new sync
const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "forensia")]
#[command(about = "Cached access to the forensic case service")]
#[command(version)]
struct Args {
    /// Bearer token for the case service
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Service base URL (overrides the config file)
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a collection as JSON
    List {
        resource: Resource,
        /// Skip the cache and fetch from the service
        #[arg(long)]
        force: bool,
        /// Only print records filed under this case (remembered for next time)
        #[arg(long)]
        case: Option<String>,
    },
    /// Print the images of one evidence item
    Images {
        evidence_id: String,
        #[arg(long)]
        force: bool,
    },
    /// Keep a collection in sync and print it whenever it refreshes
    Watch {
        resource: Resource,
        /// Sync interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Resource {
    Evidence,
    Odontograms,
    Reports,
    Victims,
}

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the log file on drop and must outlive `main`'s
/// work.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=forensia_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("forensia.log"));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn list<C: CollectionController>(
    controller: &C,
    force: bool,
    case_id: Option<&str>,
) -> Result<()> {
    let result = controller.list(force).await?;
    info!(
        resource = controller.resource(),
        source = ?result.source,
        count = result.data.len(),
        "Listed"
    );
    match case_id {
        Some(case_id) => {
            let rows: Vec<_> = result
                .data
                .into_iter()
                .filter(|r| r.case_id() == Some(case_id))
                .collect();
            print_json(&rows)
        }
        None => print_json(&result.data),
    }
}

/// Print the view on every completed sync until Ctrl-C.
async fn watch<C: CollectionController>(controller: Arc<C>) -> Result<()> {
    controller.list(false).await?;
    let mut last_seen = controller.snapshot().last_synced;
    print_json(&controller.snapshot())?;

    controller.start_sync();
    let mut poll = tokio::time::interval(WATCH_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {
                let snapshot = controller.snapshot();
                if snapshot.last_synced != last_seen {
                    last_seen = snapshot.last_synced;
                    print_json(&snapshot)?;
                }
            }
        }
    }

    controller.stop_sync();
    info!(resource = controller.resource(), "Watch ended");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let _log_guard = init_tracing(args.log_file.as_deref());

    let mut config = Config::load()?;
    let base_url = args.api_url.clone().unwrap_or_else(|| config.api_base_url());

    if let Command::Config = args.command {
        let settings = config.controller_settings();
        return print_json(&serde_json::json!({
            "config_path": Config::config_path()?,
            "api_base_url": base_url,
            "cache_ttl_secs": settings.ttl.as_secs(),
            "sync_interval_secs": settings.sync_interval.as_secs(),
            "request_timeout_secs": config.request_timeout().as_secs(),
            "last_case_id": config.last_case_id,
            "token_set": args.token.is_some(),
        }));
    }

    let mut client = HttpClient::new(base_url, config.request_timeout())?;
    if let Some(token) = args.token {
        client.set_token(token);
    }

    let mut settings = config.controller_settings();
    if let Command::Watch {
        interval: Some(secs),
        ..
    } = args.command
    {
        settings = ControllerSettings {
            sync_interval: Duration::from_secs(secs.max(1)),
            ..settings
        };
    }
    let controllers = Controllers::new(Arc::new(client), &settings);

    match args.command {
        Command::List {
            resource,
            force,
            case,
        } => {
            let case = case.as_deref().map(str::trim).filter(|c| !c.is_empty());
            if let Some(case_id) = case {
                if config.remember_case(case_id) {
                    if let Err(e) = config.save() {
                        warn!(error = %e, "Could not save last case");
                    }
                }
            }
            match resource {
                Resource::Evidence => list(controllers.evidence.as_ref(), force, case).await,
                Resource::Odontograms => {
                    list(controllers.odontograms.as_ref(), force, case).await
                }
                Resource::Reports => list(controllers.reports.as_ref(), force, case).await,
                Resource::Victims => list(controllers.victims.as_ref(), force, case).await,
            }
        }
        Command::Images { evidence_id, force } => {
            let result = controllers.images.list(&evidence_id, force).await?;
            info!(evidence_id = %evidence_id, source = ?result.source, "Listed images");
            print_json(&result.data)
        }
        Command::Watch { resource, .. } => match resource {
            Resource::Evidence => watch(controllers.evidence.clone()).await,
            Resource::Odontograms => watch(controllers.odontograms.clone()).await,
            Resource::Reports => watch(controllers.reports.clone()).await,
            Resource::Victims => watch(controllers.victims.clone()).await,
        },
        Command::Config => Ok(()),
    }
}
