// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed, retried webhook delivery.
//!
//! Each call to [`DeliveryEngine::deliver`] or [`DeliveryEngine::deliver_file`]
//! runs a bounded attempt loop. The body bytes and their signature are fixed
//! before the first attempt, so every retry transmits exactly what was signed.
//! When the budget runs out a [`DeadLetterRecord`] is published to the errors
//! queue; that hand-off is best-effort and never surfaces to the caller.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use url::form_urlencoded;
use zapbridge_config::model::QueueConfig;
use zapbridge_config::WebhookFormat;
use zapbridge_core::{BridgeError, QueuePublisher, Tenant};
use zapbridge_vault::CredentialVault;

use crate::dead_letter::DeadLetterRecord;
use crate::policy::DeliveryPolicy;
use crate::signing::{SIGNATURE_HEADER, sign_payload};

/// Flat string fields describing one event. Ordered so that both the form
/// encoding and the JSON used for file signatures are deterministic.
pub type EventFields = BTreeMap<String, String>;

/// Field holding the event serialized as JSON.
const JSON_DATA_FIELD: &str = "jsonData";
const INSTANCE_NAME_FIELD: &str = "instanceName";
const USER_ID_FIELD: &str = "userID";
const FILE_FIELD: &str = "file";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Result of one delivery call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    DeadLettered { attempts: u32, error: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// What goes on the wire, fixed before the first attempt.
enum Body {
    Encoded {
        content_type: &'static str,
        bytes: Vec<u8>,
    },
    Multipart {
        fields: EventFields,
        path: String,
    },
}

/// Posts events to tenant webhooks and publishes them to the shared queues.
pub struct DeliveryEngine {
    http: reqwest::Client,
    policy: DeliveryPolicy,
    queue: QueueConfig,
    vault: Option<Arc<CredentialVault>>,
    publisher: Arc<dyn QueuePublisher>,
}

impl DeliveryEngine {
    /// Redirects are not followed; a 3xx answer counts as a failed attempt.
    pub fn new(
        policy: DeliveryPolicy,
        queue: QueueConfig,
        vault: Option<Arc<CredentialVault>>,
        publisher: Arc<dyn QueuePublisher>,
    ) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(policy.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| BridgeError::Delivery(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            policy,
            queue,
            vault,
            publisher,
        })
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    /// Delivers `fields` to `url` as a form or JSON body, per the configured format.
    pub async fn deliver(&self, url: &str, fields: &EventFields, tenant: &Tenant) -> DeliveryOutcome {
        info!(tenant = %tenant.id, url, "delivering webhook");

        let (payload, bytes, content_type) = match self.policy.format {
            WebhookFormat::Json => {
                let body = json_body(fields, tenant);
                match serde_json::to_vec(&body) {
                    Ok(bytes) => (body, bytes, JSON_CONTENT_TYPE),
                    Err(e) => {
                        error!(tenant = %tenant.id, error = %e, "failed to serialize webhook body");
                        return self
                            .dead_letter(url, body, tenant, None, 0, e.to_string())
                            .await;
                    }
                }
            }
            WebhookFormat::Form => {
                let encoded = form_body(fields);
                (fields_value(fields), encoded.into_bytes(), FORM_CONTENT_TYPE)
            }
        };

        let signature = self.signature(tenant, &bytes);
        let body = Body::Encoded {
            content_type,
            bytes,
        };
        self.run(url, &body, signature.as_deref(), tenant, payload, None)
            .await
    }

    /// Delivers `fields` plus the file at `path` as a multipart form.
    ///
    /// The signature covers the JSON encoding of the fields with `file` set to
    /// the path, never the file content.
    pub async fn deliver_file(
        &self,
        url: &str,
        fields: &EventFields,
        tenant: &Tenant,
        path: &Path,
    ) -> DeliveryOutcome {
        let path_str = path.to_string_lossy().into_owned();
        info!(tenant = %tenant.id, url, file = %path_str, "delivering file webhook");

        let mut fields = fields.clone();
        fields.insert(FILE_FIELD.to_string(), path_str.clone());

        let signature = if tenant.hmac_key.is_some() {
            match serde_json::to_vec(&fields) {
                Ok(bytes) => self.signature(tenant, &bytes),
                Err(e) => {
                    error!(tenant = %tenant.id, error = %e, "failed to serialize fields for signing");
                    None
                }
            }
        } else {
            None
        };

        let payload = fields_value(&fields);
        let body = Body::Multipart {
            fields,
            path: path_str.clone(),
        };
        self.run(url, &body, signature.as_deref(), tenant, payload, Some(path_str))
            .await
    }

    /// Routes one event: webhook when the tenant has a URL, events queue when
    /// the event carries JSON. Returns the webhook outcome, if one was attempted.
    pub async fn dispatch(
        &self,
        tenant: &Tenant,
        fields: &EventFields,
        file: Option<&Path>,
    ) -> Option<DeliveryOutcome> {
        if let Some(json) = fields.get(JSON_DATA_FIELD) {
            self.publish_event(tenant, json.as_bytes()).await;
        }

        let url = tenant
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())?;

        let outcome = match file {
            Some(path) => self.deliver_file(url, fields, tenant, path).await,
            None => self.deliver(url, fields, tenant).await,
        };
        Some(outcome)
    }

    /// Publishes an event to the events queue with the tenant's id and name
    /// merged in. Non-object JSON is dropped with a warning.
    pub async fn publish_event(&self, tenant: &Tenant, event_json: &[u8]) {
        let mut event = match serde_json::from_slice::<Value>(event_json) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(tenant = %tenant.id, "event is not a JSON object, not queued");
                return;
            }
            Err(e) => {
                warn!(tenant = %tenant.id, error = %e, "event is not valid JSON, not queued");
                return;
            }
        };
        event.insert(USER_ID_FIELD.into(), Value::String(tenant.id.to_string()));
        event.insert(INSTANCE_NAME_FIELD.into(), Value::String(tenant.name.clone()));

        match serde_json::to_vec(&Value::Object(event)) {
            Ok(bytes) => self.publish(&self.queue.events_queue, bytes).await,
            Err(e) => warn!(tenant = %tenant.id, error = %e, "failed to serialize queued event"),
        }
    }

    async fn run(
        &self,
        url: &str,
        body: &Body,
        signature: Option<&str>,
        tenant: &Tenant,
        payload: Value,
        file_path: Option<String>,
    ) -> DeliveryOutcome {
        let budget = self.policy.attempts();
        let mut attempts = 0;
        let mut last_error = String::new();

        while attempts < budget {
            if attempts > 0 {
                let delay = self.policy.backoff(attempts);
                warn!(
                    tenant = %tenant.id,
                    url,
                    attempt = attempts + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retrying webhook with exponential backoff"
                );
                tokio::time::sleep(delay).await;
            }
            attempts += 1;

            let request = match self.request(url, body, signature).await {
                Ok(request) => request,
                Err(e) => {
                    error!(tenant = %tenant.id, url, attempt = attempts, error = %e, "failed to build webhook request");
                    last_error = e.to_string();
                    continue;
                }
            };

            match request.send().await {
                Err(e) => {
                    error!(tenant = %tenant.id, url, attempt = attempts, error = %e, "webhook failed due to transport error");
                    last_error = e.to_string();
                }
                Ok(response) if response.status().is_success() => {
                    info!(tenant = %tenant.id, url, status = response.status().as_u16(), attempt = attempts, "webhook delivered");
                    return DeliveryOutcome::Delivered { attempts };
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    error!(tenant = %tenant.id, url, status, attempt = attempts, "webhook failed with non-2xx status");
                    last_error = format!("unexpected status code: {status}. Body: {text}");
                    if !self.policy.retry_enabled {
                        break;
                    }
                }
            }
        }

        error!(tenant = %tenant.id, url, attempts, "webhook permanently failed, sending to error queue");
        self.dead_letter(url, payload, tenant, file_path, attempts, last_error)
            .await
    }

    async fn request(
        &self,
        url: &str,
        body: &Body,
        signature: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, BridgeError> {
        let mut request = self.http.post(url);
        request = match body {
            Body::Encoded {
                content_type,
                bytes,
            } => request
                .header(CONTENT_TYPE, *content_type)
                .body(bytes.clone()),
            Body::Multipart { fields, path } => {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|e| BridgeError::Delivery(format!("failed to read {path}: {e}")))?;
                let file_name = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| FILE_FIELD.to_string());

                let mut form = Form::new();
                for (key, value) in fields {
                    form = form.text(key.clone(), value.clone());
                }
                form = form.part(FILE_FIELD, Part::bytes(data).file_name(file_name));
                request.multipart(form)
            }
        };
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        Ok(request)
    }

    /// Opens the tenant's sealed key and signs `bytes`. Any failure is logged
    /// and the request goes out unsigned.
    fn signature(&self, tenant: &Tenant, bytes: &[u8]) -> Option<String> {
        let sealed = tenant.hmac_key.as_deref().filter(|k| !k.is_empty())?;
        let Some(vault) = self.vault.as_ref() else {
            warn!(tenant = %tenant.id, "tenant has a signing key but no vault key is configured");
            return None;
        };

        let result = vault
            .open(sealed)
            .and_then(|key| sign_payload(key.expose_secret(), bytes));
        match result {
            Ok(signature) => Some(signature),
            Err(e) => {
                error!(tenant = %tenant.id, error = %e, "failed to generate HMAC signature");
                None
            }
        }
    }

    async fn dead_letter(
        &self,
        url: &str,
        payload: Value,
        tenant: &Tenant,
        file_path: Option<String>,
        attempts: u32,
        error: String,
    ) -> DeliveryOutcome {
        let record = DeadLetterRecord {
            url: url.to_string(),
            payload,
            user_id: tenant.id.to_string(),
            encrypted_hmac_key: hex::encode(tenant.hmac_key.as_deref().unwrap_or_default()),
            file_path,
            attempt_time: Utc::now(),
            error_message: error.clone(),
        };

        match serde_json::to_vec(&record) {
            Ok(bytes) => self.publish(&self.queue.errors_queue, bytes).await,
            Err(e) => error!(tenant = %tenant.id, error = %e, "failed to serialize dead-letter record"),
        }

        DeliveryOutcome::DeadLettered { attempts, error }
    }

    async fn publish(&self, queue: &str, payload: Vec<u8>) {
        if !self.queue.enabled || !self.publisher.is_enabled() {
            debug!(queue, "queue publishing disabled, dropping message");
            return;
        }
        let limit = Duration::from_millis(self.queue.publish_timeout_ms);
        match tokio::time::timeout(limit, self.publisher.publish(queue, payload)).await {
            Ok(Ok(())) => debug!(queue, "published to queue"),
            Ok(Err(e)) => error!(queue, error = %e, "failed to publish to queue"),
            Err(_) => error!(queue, timeout_ms = self.queue.publish_timeout_ms, "queue publish timed out"),
        }
    }
}

/// JSON mode body: the parsed `jsonData` object when present, otherwise the
/// flat fields. `instanceName` is carried over and `userID` always set.
fn json_body(fields: &EventFields, tenant: &Tenant) -> Value {
    let parsed = fields
        .get(JSON_DATA_FIELD)
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok());

    let mut body = match parsed {
        Some(Value::Object(map)) => map,
        _ => return with_user(fields_value(fields), tenant),
    };
    if let Some(name) = fields.get(INSTANCE_NAME_FIELD) {
        body.insert(INSTANCE_NAME_FIELD.into(), Value::String(name.clone()));
    }
    with_user(Value::Object(body), tenant)
}

fn with_user(mut body: Value, tenant: &Tenant) -> Value {
    if let Value::Object(map) = &mut body {
        map.insert(USER_ID_FIELD.into(), Value::String(tenant.id.to_string()));
    }
    body
}

/// `application/x-www-form-urlencoded` with keys in sorted order.
fn form_body(fields: &EventFields) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter())
        .finish()
}

fn fields_value(fields: &EventFields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<String, Value>>(),
    )
}
