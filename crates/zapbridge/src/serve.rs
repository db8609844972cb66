// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zapbridge serve` command implementation.
//!
//! Opens storage, unlocks the credential vault, builds the bridge service and
//! the delivery engine, starts the event pipeline, and serves the HTTP
//! gateway until SIGINT/SIGTERM.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use zapbridge_bridge::{BridgeService, ClientRegistry};
use zapbridge_config::ZapbridgeConfig;
use zapbridge_core::{BridgeError, BridgeStore, QueuePublisher};
use zapbridge_delivery::{DeliveryEngine, DeliveryPolicy, NoopQueuePublisher, SqliteQueuePublisher};
use zapbridge_gateway::{GatewayState, ServerConfig, start_server};
use zapbridge_storage::SqliteStorage;
use zapbridge_vault::CredentialVault;

use crate::pipeline::{EVENT_CHANNEL_CAPACITY, EventPipeline};
use crate::shutdown;

/// Runs the `zapbridge serve` command.
pub async fn run_serve(config: ZapbridgeConfig) -> Result<(), BridgeError> {
    init_tracing(&config.server.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting zapbridge serve");

    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };

    let vault = CredentialVault::from_config(&config.vault)?.map(Arc::new);
    if vault.is_none() {
        warn!("no vault key configured, webhooks will be sent unsigned");
    }

    let publisher: Arc<dyn QueuePublisher> = if config.queue.enabled {
        info!(
            events = %config.queue.events_queue,
            errors = %config.queue.errors_queue,
            "queue publishing enabled"
        );
        Arc::new(SqliteQueuePublisher::new(Arc::clone(&storage)))
    } else {
        Arc::new(NoopQueuePublisher)
    };

    let store: Arc<dyn BridgeStore> = storage.clone();
    let registry = Arc::new(ClientRegistry::new());
    let bridge = Arc::new(BridgeService::new(
        Arc::clone(&store),
        registry.clone(),
        config.bridge.clone(),
    ));
    let delivery = Arc::new(DeliveryEngine::new(
        DeliveryPolicy::from_config(&config.delivery),
        config.queue.clone(),
        vault,
        publisher,
    )?);
    info!(
        retry_enabled = config.delivery.retry_enabled,
        retry_count = config.delivery.retry_count,
        format = ?config.delivery.format,
        "delivery engine ready"
    );

    let cancel = shutdown::install_signal_handler();

    // WhatsApp sessions registered in `registry` feed their message events here.
    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let pipeline = Arc::new(EventPipeline::new(
        store,
        registry,
        Arc::clone(&bridge),
        delivery,
    ));
    let worker = pipeline.spawn(events_rx, cancel.child_token());

    let state = GatewayState::new(Arc::clone(&bridge), config.server.public_url.clone());
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let result = start_server(&server_config, state, cancel.clone()).await;
    if let Err(e) = &result {
        error!(error = %e, "gateway exited with error");
    }

    cancel.cancel();
    drop(events_tx);
    if let Err(e) = worker.await {
        warn!(error = %e, "event pipeline task panicked");
    }
    bridge.shutdown();
    storage.close().await?;

    info!("zapbridge serve shutdown complete");
    result
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("zapbridge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
