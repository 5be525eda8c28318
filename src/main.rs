//! Publish Carousel service binary.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use publish_carousel::adapters::health::{HttpGtgCheck, NotifierGtgCheck};
use publish_carousel::adapters::http::{admin_router, AdminAppState};
use publish_carousel::adapters::metadata::ObjectStoreMetadataReadWriter;
use publish_carousel::adapters::native::PostgresNativeStore;
use publish_carousel::adapters::notifier::{HttpNotifier, HttpNotifierConfig};
use publish_carousel::adapters::storage::{load_blacklist, FileObjectStore};
use publish_carousel::application::{
    ClusterWatcher, CycleDeps, NativeContentPublishTask, NativeReader, Scheduler, Toggles,
};
use publish_carousel::config::{AppConfig, ServerConfig};
use publish_carousel::domain::filter::{FilterChain, ImageFilter};
use publish_carousel::ports::{NativeStore, Notifier, ServiceHealthCheck};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    let store = Arc::new(
        PostgresNativeStore::connect(
            &config.native_store.url,
            config.native_store.max_connections,
            config.native_store.connect_timeout(),
        )
        .await?,
    );
    let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::new(
        HttpNotifierConfig::new(&config.notifier.url).with_timeout(config.notifier.timeout()),
    )?);
    let metadata = Arc::new(ObjectStoreMetadataReadWriter::new(Arc::new(
        FileObjectStore::new(&config.metadata.path),
    )));

    let mut filters = FilterChain::new();
    if let Some(path) = &config.scheduler.blacklist_path {
        let blacklist = load_blacklist(path).await?;
        tracing::info!(path = %path, entries = blacklist.len(), "Loaded blacklist");
        filters = filters.with(Arc::new(blacklist));
    }
    if config.scheduler.filter_images {
        filters = filters.with(Arc::new(ImageFilter));
    }

    let publisher = NativeContentPublishTask::new(NativeReader::new(store.clone()), notifier.clone());
    let scheduler = Arc::new(Scheduler::new(
        CycleDeps {
            store: store.clone(),
            publisher: Arc::new(publisher),
            filters,
        },
        metadata,
        config.scheduler.checkpoint_interval(),
        Toggles {
            automatic_enabled: false,
            manual_enabled: config.scheduler.manual_enabled,
        },
    ));

    for definition in config.scheduler.load_cycles()? {
        let name = definition.name.clone();
        if let Err(e) = scheduler.add_cycle(definition).await {
            tracing::error!(name = %name, error = %e, "Skipping cycle definition");
        }
    }
    scheduler.restore_previous_state().await;

    let mut checks: Vec<Arc<dyn ServiceHealthCheck>> =
        vec![Arc::new(NotifierGtgCheck::new(notifier.clone()))];
    for service in config.cluster.services_list() {
        checks.push(Arc::new(HttpGtgCheck::new(&service, config.cluster.probe_timeout())?));
    }

    let shutdown = CancellationToken::new();
    let watcher = ClusterWatcher::new(checks, config.cluster.check_interval(), scheduler.clone());
    let watcher_handle = tokio::spawn(watcher.run(shutdown.clone()));

    let app = admin_router()
        .with_state(AdminAppState::new(scheduler.clone()))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Admin API listening");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown signal received"),
                _ = signal.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    if let Err(e) = watcher_handle.await {
        tracing::warn!(error = %e, "Cluster watcher ended abnormally");
    }
    scheduler.shutdown().await;
    store.close().await;
    tracing::info!("Publish carousel stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}
