// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of WhatsApp message events.
//!
//! Every event goes to the helpdesk bridge and, independently, to the
//! delivery engine (tenant webhook plus the shared events queue). The two
//! run concurrently; neither failure affects the other.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zapbridge_bridge::{BridgeService, InboundOutcome};
use zapbridge_core::{BridgeError, BridgeStore, ClientDirectory, MessageEvent, Tenant, TenantId};
use zapbridge_delivery::{DeliveryEngine, DeliveryOutcome, EventFields};

/// Capacity of the event channel feeding the pipeline.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// A message event received by one tenant's WhatsApp session.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub tenant: TenantId,
    pub event: MessageEvent,
}

/// What happened to one event on each branch.
#[derive(Debug)]
pub struct PipelineReport {
    /// `None` when the tenant has no live WhatsApp client.
    pub bridge: Option<Result<InboundOutcome, BridgeError>>,
    /// `None` when the tenant has no webhook URL.
    pub webhook: Option<DeliveryOutcome>,
}

pub struct EventPipeline {
    store: Arc<dyn BridgeStore>,
    directory: Arc<dyn ClientDirectory>,
    bridge: Arc<BridgeService>,
    delivery: Arc<DeliveryEngine>,
}

impl EventPipeline {
    pub fn new(
        store: Arc<dyn BridgeStore>,
        directory: Arc<dyn ClientDirectory>,
        bridge: Arc<BridgeService>,
        delivery: Arc<DeliveryEngine>,
    ) -> Self {
        Self {
            store,
            directory,
            bridge,
            delivery,
        }
    }

    /// Processes one event to completion.
    pub async fn handle(
        &self,
        tenant_id: &TenantId,
        event: &MessageEvent,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, BridgeError> {
        let tenant = self
            .store
            .get_tenant(tenant_id)
            .await?
            .ok_or_else(|| BridgeError::Validation(format!("unknown tenant {tenant_id}")))?;
        let fields = event_fields(&tenant, event)?;

        let bridge = async {
            match self.directory.client_for(tenant_id) {
                Some(client) => Some(
                    self.bridge
                        .handle_incoming_message(tenant_id, event, client.as_ref(), cancel)
                        .await,
                ),
                None => {
                    debug!(tenant = %tenant_id, "no WhatsApp client registered, skipping bridge");
                    None
                }
            }
        };
        let webhook = self.delivery.dispatch(&tenant, &fields, None);

        let (bridge, webhook) = tokio::join!(bridge, webhook);
        if let Some(Err(e)) = &bridge {
            warn!(tenant = %tenant_id, message_id = %event.info.id, error = %e, "bridge failed");
        }
        Ok(PipelineReport { bridge, webhook })
    }

    /// Consumes events until the channel closes or `cancel` fires. Each
    /// event runs on its own task.
    pub fn spawn(
        self: Arc<Self>,
        mut events: mpsc::Receiver<InboundEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = events.recv() => {
                        let Some(InboundEvent { tenant, event }) = next else { break };
                        let pipeline = Arc::clone(&self);
                        let cancel = cancel.child_token();
                        tokio::spawn(async move {
                            if let Err(e) = pipeline.handle(&tenant, &event, &cancel).await {
                                warn!(tenant = %tenant, message_id = %event.info.id, error = %e, "event dropped");
                            }
                        });
                    }
                }
            }
            info!("event pipeline stopped");
        })
    }
}

/// Flat fields for the delivery engine: the event as JSON plus the tenant's
/// display name.
pub fn event_fields(tenant: &Tenant, event: &MessageEvent) -> Result<EventFields, BridgeError> {
    let json = serde_json::to_string(&json!({ "type": "Message", "event": event }))
        .map_err(|e| BridgeError::Internal(format!("failed to serialize event: {e}")))?;

    let mut fields = EventFields::new();
    fields.insert("jsonData".into(), json);
    fields.insert("instanceName".into(), tenant.name.clone());
    Ok(fields)
}
