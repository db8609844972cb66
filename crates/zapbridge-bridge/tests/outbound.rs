// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound path: helpdesk agent replies into WhatsApp.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use zapbridge_bridge::{BridgeService, ClientRegistry, DedupGuard, InboundOutcome, WebhookAck};
use zapbridge_config::model::BridgeConfig;
use zapbridge_core::{BridgeError, OutgoingContent, TenantId};
use zapbridge_test_utils::{InMemoryStore, MockWhatsAppClient, fixtures};

const TOKEN: &str = "token-t1";

struct Harness {
    store: Arc<InMemoryStore>,
    registry: Arc<ClientRegistry>,
    service: BridgeService,
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    store.add_tenant(fixtures::tenant("t1")).await;
    store
        .put_config(fixtures::bridge_config("t1", "http://127.0.0.1:9"))
        .await;
    let registry = Arc::new(ClientRegistry::new());
    let service = BridgeService::new(store.clone(), registry.clone(), BridgeConfig::default());
    Harness {
        store,
        registry,
        service,
    }
}

fn with_client(h: &Harness, client: MockWhatsAppClient) -> Arc<MockWhatsAppClient> {
    let client = Arc::new(client);
    h.registry.register(TenantId::from("t1"), client.clone());
    client
}

fn reply(content: &str) -> Value {
    json!({
        "event": "message_created",
        "message_type": "outgoing",
        "id": 501,
        "content": content,
        "private": false,
        "conversation": {
            "id": 10,
            "status": "open",
            "meta": {"sender": {"id": 5, "identifier": "5511999999999@s.whatsapp.net", "phone_number": "+5511999999999"}},
            "messages": [{"id": 501, "source_id": null, "attachments": []}]
        },
        "inbox": {"id": 7, "name": "WhatsApp Inbox"},
        "sender": {"name": "Ana Souza", "available_name": "Ana"}
    })
}

async fn send(h: &Harness, token: &str, payload: &Value) -> Result<WebhookAck, BridgeError> {
    h.service
        .handle_outgoing_webhook(token, payload.to_string().as_bytes())
        .await
}

#[tokio::test]
async fn text_reply_is_sent_and_registered_for_echo_suppression() {
    let h = harness().await;
    let client = with_client(&h, MockWhatsAppClient::new());

    let ack = send(&h, TOKEN, &reply("Hi there")).await.unwrap();
    assert_eq!(
        ack,
        WebhookAck::Delivered {
            message_ids: vec!["MOCK-1".into()]
        }
    );

    let sent = client.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.to_string(), "5511999999999@s.whatsapp.net");
    assert_eq!(
        sent[0].content,
        OutgoingContent::Text {
            text: "Hi there".into()
        }
    );

    let tenant = TenantId::from("t1");
    assert!(h.service.dedup().contains(&DedupGuard::key(&tenant, "MOCK-1")));

    // The echo arriving through the inbound path does nothing.
    let echo = h
        .service
        .handle_incoming_message(
            &tenant,
            &fixtures::text_event("MOCK-1", "5511999999999", "Hi there"),
            client.as_ref(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(echo, InboundOutcome::Duplicate);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let h = harness().await;
    let result = send(&h, "bogus", &reply("hi")).await;
    assert!(matches!(result, Err(BridgeError::Unauthorized(_))));
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let h = harness().await;
    let result = h.service.handle_outgoing_webhook(TOKEN, b"{not json").await;
    assert!(matches!(result, Err(BridgeError::Validation(_))));
}

#[tokio::test]
async fn filtered_events_are_ignored_without_sending() {
    let h = harness().await;
    let client = with_client(&h, MockWhatsAppClient::new());

    let mut created = reply("x");
    created["event"] = json!("conversation_updated");
    assert_eq!(
        send(&h, TOKEN, &created).await.unwrap(),
        WebhookAck::Ignored("not message_created")
    );

    let mut incoming = reply("x");
    incoming["message_type"] = json!("incoming");
    assert_eq!(
        send(&h, TOKEN, &incoming).await.unwrap(),
        WebhookAck::Ignored("not outgoing")
    );

    let mut note = reply("x");
    note["private"] = json!(true);
    assert_eq!(
        send(&h, TOKEN, &note).await.unwrap(),
        WebhookAck::Ignored("private note")
    );

    let mut echo = reply("x");
    echo["conversation"]["messages"][0]["source_id"] = json!("WAID:ABC");
    assert_eq!(
        send(&h, TOKEN, &echo).await.unwrap(),
        WebhookAck::Ignored("loop prevention")
    );

    assert_eq!(client.sent_count().await, 0);
}

#[tokio::test]
async fn missing_destination_is_rejected_without_sending() {
    let h = harness().await;
    let client = with_client(&h, MockWhatsAppClient::new());
    let mut payload = reply("hi");
    payload["conversation"]["meta"]["sender"] = json!({"id": 5});

    let result = send(&h, TOKEN, &payload).await;
    assert!(matches!(result, Err(BridgeError::Validation(_))));
    assert_eq!(client.sent_count().await, 0);
}

#[tokio::test]
async fn phone_number_is_used_when_identifier_is_absent() {
    let h = harness().await;
    let client = with_client(&h, MockWhatsAppClient::new());
    let mut payload = reply("hi");
    payload["conversation"]["meta"]["sender"] = json!({"id": 5, "phone_number": "+5511888887777"});

    send(&h, TOKEN, &payload).await.unwrap();
    assert_eq!(
        client.sent_messages().await[0].to.to_string(),
        "5511888887777@s.whatsapp.net"
    );
}

#[tokio::test]
async fn mapping_is_stored_even_when_whatsapp_is_unavailable() {
    let h = harness().await;
    let result = send(&h, TOKEN, &reply("hi")).await;
    assert!(matches!(result, Err(BridgeError::Unavailable(_))));

    let conversations = h.store.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].conversation_id, 10);
    assert_eq!(conversations[0].contact_id, 5);
    assert_eq!(conversations[0].inbox_id, 7);
    assert_eq!(
        h.service
            .conversations()
            .cached(&TenantId::from("t1"), "5511999999999@s.whatsapp.net"),
        Some(10)
    );
}

#[tokio::test]
async fn logged_out_or_disconnected_session_is_unavailable() {
    let h = harness().await;
    with_client(&h, MockWhatsAppClient::logged_out());
    assert!(matches!(
        send(&h, TOKEN, &reply("hi")).await,
        Err(BridgeError::Unavailable(_))
    ));

    with_client(&h, MockWhatsAppClient::disconnected());
    assert!(matches!(
        send(&h, TOKEN, &reply("hi")).await,
        Err(BridgeError::Unavailable(_))
    ));
}

#[tokio::test]
async fn each_attachment_is_sent_as_media() {
    let h = harness().await;
    let client = with_client(&h, MockWhatsAppClient::new());
    let mut payload = reply("");
    payload["conversation"]["messages"][0]["attachments"] = json!([
        {"data_url": "https://cw.example/a.png", "file_type": "image"},
        {"data_url": "https://cw.example/b.pdf", "file_type": "file"}
    ]);

    let ack = send(&h, TOKEN, &payload).await.unwrap();
    assert_eq!(
        ack,
        WebhookAck::Delivered {
            message_ids: vec!["MOCK-1".into(), "MOCK-2".into()]
        }
    );
    let sent = client.sent_messages().await;
    assert_eq!(
        sent[0].content,
        OutgoingContent::Media {
            url: "https://cw.example/a.png".into(),
            file_type: "image".into(),
            caption: "https://cw.example/a.png".into(),
        }
    );
    assert_eq!(
        sent[1].content,
        OutgoingContent::Media {
            url: "https://cw.example/b.pdf".into(),
            file_type: "file".into(),
            caption: "https://cw.example/b.pdf".into(),
        }
    );
}

#[tokio::test]
async fn attachment_caption_is_the_message_content() {
    let h = harness().await;
    let client = with_client(&h, MockWhatsAppClient::new());
    let mut payload = reply("your invoice");
    payload["conversation"]["messages"][0]["attachments"] =
        json!([{"data_url": "https://cw.example/b.pdf", "file_type": "file"}]);

    send(&h, TOKEN, &payload).await.unwrap();
    match &client.sent_messages().await[0].content {
        OutgoingContent::Media { caption, .. } => assert_eq!(caption, "your invoice"),
        other => panic!("expected media, got {other:?}"),
    }
}

#[tokio::test]
async fn signed_replies_carry_the_agent_name() {
    let h = harness().await;
    let mut config = fixtures::bridge_config("t1", "http://127.0.0.1:9");
    config.sign_messages = true;
    h.store.put_config(config).await;
    let client = with_client(&h, MockWhatsAppClient::new());

    send(&h, TOKEN, &reply("Hi there")).await.unwrap();
    assert_eq!(
        client.sent_messages().await[0].content,
        OutgoingContent::Text {
            text: "*Ana*\nHi there".into()
        }
    );
}

#[tokio::test]
async fn empty_reply_without_attachments_sends_nothing() {
    let h = harness().await;
    let client = with_client(&h, MockWhatsAppClient::new());
    let ack = send(&h, TOKEN, &reply("")).await.unwrap();
    assert_eq!(
        ack,
        WebhookAck::Delivered {
            message_ids: vec![]
        }
    );
    assert_eq!(client.sent_count().await, 0);
}

#[tokio::test]
async fn send_failure_is_surfaced() {
    let h = harness().await;
    let client = with_client(&h, MockWhatsAppClient::new());
    client.fail_sends();
    let result = send(&h, TOKEN, &reply("hi")).await;
    assert!(matches!(result, Err(BridgeError::WhatsApp { .. })));
}
