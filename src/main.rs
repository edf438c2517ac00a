use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use archival_zone::config::Config;
use archival_zone::diagnostics::{run_diagnostics, WaterYear};
use archival_zone::filter::filter_by_pattern;
use archival_zone::ingestion::{
    ingest, ingest_collecting, ingest_parallel, CompositeObserver, FileKind, FileObserver,
    IngestionObserver, IngestionOptions, TracingObserver,
};
use archival_zone::remote::{list_file_paths, DropboxClient, LocalStore, RemoteStore};
use archival_zone::types::Table;

fn main() {
    setup_logging();
    if let Err(error) = run() {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}

/// Structured logging to stderr; `RUST_LOG` overrides the default level.
fn setup_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("archival_zone=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run() -> Result<()> {
    let config = Config::load().context("loading configuration")?;
    debug!(?config, "configuration loaded");
    let run = &config.run;

    let water_year = match run.water_year {
        Some(wy) => Some(
            WaterYear::from_two_digit(wy)
                .with_context(|| format!("water year {wy} is not representable"))?,
        ),
        None => None,
    };

    let store = open_store(&config)?;

    let paths = list_file_paths(store.as_ref(), &run.folder)
        .with_context(|| format!("listing {}", run.folder))?;
    let matched = filter_by_pattern(&paths, &run.pattern)?;
    info!(
        folder = %run.folder,
        pattern = %run.pattern,
        listed = paths.len(),
        matched = matched.len(),
        "files selected"
    );

    let options = IngestionOptions {
        format: run.format_options(),
        observer: Some(build_observer(&config)),
        ..Default::default()
    };

    if run.skip_failed && run.workers > 1 {
        warn!(
            workers = run.workers,
            "run.skip_failed ingests sequentially; run.workers is ignored"
        );
    }

    let results: Vec<(String, Table)> = if run.skip_failed {
        let report = ingest_collecting(store.as_ref(), &matched, &options);
        for failed in &report.failed {
            warn!(path = %failed.path, error = %failed.error, "skipped failed file");
        }
        report
            .ingested
            .into_iter()
            .map(|f| (f.path, f.table))
            .collect()
    } else {
        let tables = if run.uses_worker_pool() {
            ingest_parallel(store.as_ref(), &matched, &options, run.workers)?
        } else {
            ingest(store.as_ref(), &matched, &options)?
        };
        matched
            .into_iter()
            .filter(|p| FileKind::from_path(p) != FileKind::Unknown)
            .zip(tables)
            .collect()
    };

    for (path, table) in &results {
        println!("{path} ({} rows)", table.row_count());
        println!("  {}", run_diagnostics(table, water_year));
    }
    info!(files = results.len(), "done");
    Ok(())
}

fn open_store(config: &Config) -> Result<Box<dyn RemoteStore>> {
    if let Some(root) = &config.dropbox.local_root {
        info!(root = %root.display(), "reading from local folder");
        return Ok(Box::new(LocalStore::new(root)));
    }
    let client = DropboxClient::new(&config.dropbox)?;
    let account = client
        .verify_account()
        .context("verifying Dropbox access token")?;
    info!(%account, "connected to Dropbox");
    Ok(Box::new(client))
}

fn build_observer(config: &Config) -> Arc<dyn IngestionObserver> {
    let tracing_obs: Arc<dyn IngestionObserver> = Arc::new(TracingObserver);
    match &config.run.progress_log {
        Some(path) => {
            let file_obs: Arc<dyn IngestionObserver> = Arc::new(FileObserver::new(path));
            Arc::new(CompositeObserver::new(vec![tracing_obs, file_obs]))
        }
        None => tracing_obs,
    }
}
