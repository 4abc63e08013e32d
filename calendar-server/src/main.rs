use std::{env, sync::Arc};

use anyhow::{Context, Result};
use log::info;
use tokio::{net::TcpListener, signal};

use calendar_server::{
    cache, cli,
    export::write_calendars,
    server::{router, AppState},
    store::EventStore,
};

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "calendar_server=info,calendar_events=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse(env::args().collect());

    setup_logging();

    let rules = args.rules().context("Failed to load categories")?;
    let exporter = Arc::new(args.exporter(rules.clone()));
    let store = Arc::new(EventStore::new(
        args.source.clone(),
        rules,
        cache::Config {
            enabled: args.enable_cache,
            ttl: args.cache_ttl,
        },
    ));

    if let Some(dir) = &args.export_dir {
        let loaded = store.events_or_fallback().await;
        let report = write_calendars(dir, &args.prefix, &exporter, &loaded.events)
            .await
            .context("Failed to export calendars")?;

        info!(
            "Wrote {} calendars to {} ({} events skipped)",
            report.written.len(),
            dir.display(),
            report.skipped + loaded.skipped.len()
        );
        return Ok(());
    }

    let listener = TcpListener::bind(args.address).await?;
    info!("Serving events from {}", store.source());
    info!("Listening at http://{}", args.address);

    axum::serve(listener, router(AppState::new(store, exporter)))
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
