mod cli;
mod commands;
mod config;
mod logging;
mod persistence;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use nurture_client::{AnalysisService, ApiClient, HttpAnalysisApi, SharedStore};
use nurture_core::{AnalysisStore, Msg};
use nurture_logging::{level_from_verbosity, nurture_warn};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::logging::LogDestination;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(destination) = LogDestination::select(cli.log_file.as_deref(), cli.quiet) {
        logging::initialize(destination, level_from_verbosity(cli.verbose));
    }

    let config = AppConfig::load(&cli)?;
    let client = ApiClient::new(&config.client)
        .context("building HTTP client")?
        .with_session_listener(Arc::new(|| {
            nurture_warn!("Session expired; set a fresh token with --token or NURTURE_API_TOKEN");
        }));

    let store: SharedStore = Arc::new(Mutex::new(AnalysisStore::new()));
    let service = AnalysisService::new(Arc::new(HttpAnalysisApi::new(client)), store.clone());
    service.dispatch(Msg::Restore(persistence::load_snapshot(&config.cache_file)));
    // Restoring alone is not worth a rewrite.
    consume_dirty(&store);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let outcome = runtime.block_on(commands::run(&service, &config, cli.command));

    // Failed runs still leave useful state behind (e.g. a record marked failed).
    if consume_dirty(&store) {
        let snapshot = store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .snapshot();
        persistence::save_snapshot(&config.cache_file, &snapshot);
    }
    outcome
}

fn consume_dirty(store: &SharedStore) -> bool {
    store
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .consume_dirty()
}
